//! User selection state and its persisted record.
//!
//! Every change goes through [`SelectionState::apply`], which validates the
//! mutation before touching any field. Per-element and per-energy multiplier
//! lookups resolve to 1.0 when unset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::AL_K_ALPHA;
use crate::db::XpsDb;
use crate::error::{Result, XpsError};
use crate::lookup::LookupKey;

pub const DEFAULT_ELEMENT: &str = "neon";
pub const DEFAULT_PHOTON_ENERGY: f64 = AL_K_ALPHA;
pub const DEFAULT_WIDTH_PERCENT: f64 = 1.0;
pub const DEFAULT_WIDTH_FIXED_EV: f64 = 0.5;
pub const MULTIPLIER_MIN: f64 = 0.0;
pub const MULTIPLIER_MAX: f64 = 100.0;

/// Gaussian width: `percent` of the peak's kinetic energy plus `fixed_ev`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BroadeningWidth {
    pub percent: f64,
    pub fixed_ev: f64,
}

impl BroadeningWidth {
    pub fn new(percent: f64, fixed_ev: f64) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(percent) || !valid(fixed_ev) {
            return Err(XpsError::InvalidWidth { percent, fixed_ev });
        }
        Ok(BroadeningWidth { percent, fixed_ev })
    }

    /// FWHM (eV) of a peak at `kinetic_energy`.
    pub fn fwhm_at(&self, kinetic_energy: f64) -> f64 {
        self.percent / 100.0 * kinetic_energy + self.fixed_ev
    }
}

impl Default for BroadeningWidth {
    fn default() -> Self {
        BroadeningWidth {
            percent: DEFAULT_WIDTH_PERCENT,
            fixed_ev: DEFAULT_WIDTH_FIXED_EV,
        }
    }
}

/// Open kinetic energy interval `(emin, emax)` a spectrum is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindow {
    pub emin: f64,
    pub emax: f64,
}

impl EnergyWindow {
    pub fn new(emin: f64, emax: f64) -> Result<Self> {
        if !emin.is_finite() || !emax.is_finite() || emin < 0.0 || emax <= emin {
            return Err(XpsError::InvalidEnergyWindow { emin, emax });
        }
        Ok(EnergyWindow { emin, emax })
    }

    pub fn contains(&self, energy: f64) -> bool {
        energy > self.emin && energy < self.emax
    }
}

/// A single user action against the selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddElement(String),
    RemoveElement(String),
    AddPhotonEnergy(f64),
    RemovePhotonEnergy(f64),
    SetWorkFunction(f64),
    SetElementMultiplier { element: String, value: f64 },
    SetEnergyMultiplier { photon_energy: f64, value: f64 },
    SetBroadening(bool),
    SetBroadeningWidth { percent: f64, fixed_ev: f64 },
    SetAnnotations(bool),
    SetAuger(bool),
    SetEnergyWindow(Option<(f64, f64)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    elements: Vec<String>,
    photon_energies: Vec<f64>,
    work_function: f64,
    element_multipliers: BTreeMap<String, f64>,
    energy_multipliers: Vec<(f64, f64)>,
    broadening: bool,
    width: BroadeningWidth,
    annotations: bool,
    auger: bool,
    window: Option<EnergyWindow>,
    photoelectron_lookup: LookupKey,
    auger_lookup: LookupKey,
}

impl Default for SelectionState {
    fn default() -> Self {
        SelectionState {
            elements: vec![DEFAULT_ELEMENT.to_string()],
            photon_energies: vec![DEFAULT_PHOTON_ENERGY],
            work_function: 0.0,
            element_multipliers: BTreeMap::new(),
            energy_multipliers: Vec::new(),
            broadening: false,
            width: BroadeningWidth::default(),
            annotations: true,
            auger: true,
            window: None,
            photoelectron_lookup: LookupKey::KineticEnergy,
            auger_lookup: LookupKey::PhotonEnergy,
        }
    }
}

impl SelectionState {
    /// A selection with nothing chosen and every flag at its default.
    pub fn empty() -> Self {
        SelectionState {
            elements: Vec::new(),
            photon_energies: Vec::new(),
            ..Self::default()
        }
    }

    /// Validate and apply a mutation. Returns whether anything changed;
    /// on error the state is untouched.
    pub fn apply(&mut self, mutation: Mutation) -> Result<bool> {
        match mutation {
            Mutation::AddElement(element) => {
                if self.elements.contains(&element) {
                    return Ok(false);
                }
                self.elements.push(element);
            }
            Mutation::RemoveElement(element) => {
                let before = self.elements.len();
                self.elements.retain(|e| *e != element);
                return Ok(self.elements.len() != before);
            }
            Mutation::AddPhotonEnergy(energy) => {
                check_photon_energy(energy)?;
                if self.photon_energies.contains(&energy) {
                    return Ok(false);
                }
                self.photon_energies.push(energy);
            }
            Mutation::RemovePhotonEnergy(energy) => {
                let before = self.photon_energies.len();
                self.photon_energies.retain(|&e| e != energy);
                return Ok(self.photon_energies.len() != before);
            }
            Mutation::SetWorkFunction(value) => {
                if !value.is_finite() || value < 0.0 {
                    return Err(XpsError::InvalidWorkFunction(value));
                }
                return Ok(replace(&mut self.work_function, value));
            }
            Mutation::SetElementMultiplier { element, value } => {
                check_multiplier(value)?;
                return Ok(self.element_multipliers.insert(element, value) != Some(value));
            }
            Mutation::SetEnergyMultiplier {
                photon_energy,
                value,
            } => {
                check_photon_energy(photon_energy)?;
                check_multiplier(value)?;
                match self
                    .energy_multipliers
                    .iter_mut()
                    .find(|(e, _)| *e == photon_energy)
                {
                    Some((_, m)) => return Ok(replace(m, value)),
                    None => self.energy_multipliers.push((photon_energy, value)),
                }
            }
            Mutation::SetBroadening(on) => return Ok(replace(&mut self.broadening, on)),
            Mutation::SetBroadeningWidth { percent, fixed_ev } => {
                let width = BroadeningWidth::new(percent, fixed_ev)?;
                return Ok(replace(&mut self.width, width));
            }
            Mutation::SetAnnotations(on) => return Ok(replace(&mut self.annotations, on)),
            Mutation::SetAuger(on) => return Ok(replace(&mut self.auger, on)),
            Mutation::SetEnergyWindow(window) => {
                let window = window
                    .map(|(emin, emax)| EnergyWindow::new(emin, emax))
                    .transpose()?;
                return Ok(replace(&mut self.window, window));
            }
        }
        Ok(true)
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn photon_energies(&self) -> &[f64] {
        &self.photon_energies
    }

    pub fn work_function(&self) -> f64 {
        self.work_function
    }

    pub fn element_multiplier(&self, element: &str) -> f64 {
        self.element_multipliers.get(element).copied().unwrap_or(1.0)
    }

    pub fn energy_multiplier(&self, photon_energy: f64) -> f64 {
        self.energy_multipliers
            .iter()
            .find(|(e, _)| *e == photon_energy)
            .map_or(1.0, |&(_, m)| m)
    }

    /// Combined multiplier applied to every peak of one (element, energy) group.
    pub fn intensity_scale(&self, element: &str, photon_energy: f64) -> f64 {
        self.element_multiplier(element) * self.energy_multiplier(photon_energy)
    }

    pub fn broadening(&self) -> bool {
        self.broadening
    }

    pub fn width(&self) -> BroadeningWidth {
        self.width
    }

    pub fn annotations(&self) -> bool {
        self.annotations
    }

    pub fn auger(&self) -> bool {
        self.auger
    }

    pub fn window(&self) -> Option<EnergyWindow> {
        self.window
    }

    pub fn photoelectron_lookup(&self) -> LookupKey {
        self.photoelectron_lookup
    }

    pub fn auger_lookup(&self) -> LookupKey {
        self.auger_lookup
    }

    /// Choose the energies tables are keyed by for photoelectron and Auger peaks.
    pub fn set_lookup_keys(&mut self, photoelectron: LookupKey, auger: LookupKey) {
        self.photoelectron_lookup = photoelectron;
        self.auger_lookup = auger;
    }

    /// Rewrite element identifiers to the keys of `db`, merging aliases of
    /// the same element. Identifiers `db` does not know are kept as given.
    pub fn canonicalize(&mut self, db: &XpsDb) {
        let key = |id: &str| db.resolve_element(id).map_or_else(|_| id.to_string(), str::to_string);
        let mut elements: Vec<String> = Vec::with_capacity(self.elements.len());
        for id in &self.elements {
            let id = key(id);
            if !elements.contains(&id) {
                elements.push(id);
            }
        }
        self.elements = elements;
        self.element_multipliers = std::mem::take(&mut self.element_multipliers)
            .into_iter()
            .map(|(id, value)| (key(&id), value))
            .collect();
    }

    /// Build a selection from a (possibly partial) persisted record.
    ///
    /// Missing fields take their defaults. Present but invalid values are
    /// dropped with a warning rather than failing the whole record.
    pub fn from_record(record: &SelectionRecord) -> Self {
        let mut state = SelectionState::empty();

        let elements = record
            .elements
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_ELEMENT.to_string()]);
        for element in elements {
            absorb(&mut state, Mutation::AddElement(element));
        }

        let energies = record
            .photon_energies
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_PHOTON_ENERGY]);
        for energy in energies {
            absorb(&mut state, Mutation::AddPhotonEnergy(energy));
        }

        if let Some(wf) = record.work_function {
            absorb(&mut state, Mutation::SetWorkFunction(wf));
        }
        for (element, &value) in &record.element_multipliers {
            absorb(
                &mut state,
                Mutation::SetElementMultiplier {
                    element: element.clone(),
                    value,
                },
            );
        }
        for (key, &value) in &record.energy_multipliers {
            match key.parse::<f64>() {
                Ok(photon_energy) => absorb(
                    &mut state,
                    Mutation::SetEnergyMultiplier {
                        photon_energy,
                        value,
                    },
                ),
                Err(_) => tracing::warn!(key = %key, "ignoring non-numeric energy multiplier key"),
            }
        }

        state.broadening = record.broadening.unwrap_or(false);
        absorb(
            &mut state,
            Mutation::SetBroadeningWidth {
                percent: record.width_percent.unwrap_or(DEFAULT_WIDTH_PERCENT),
                fixed_ev: record.width_fixed_ev.unwrap_or(DEFAULT_WIDTH_FIXED_EV),
            },
        );
        state.annotations = record.annotations.unwrap_or(true);
        state.auger = record.auger.unwrap_or(true);
        if let (Some(emin), Some(emax)) = (record.emin, record.emax) {
            absorb(&mut state, Mutation::SetEnergyWindow(Some((emin, emax))));
        }
        state.set_lookup_keys(
            record.photoelectron_lookup.unwrap_or(LookupKey::KineticEnergy),
            record.auger_lookup.unwrap_or(LookupKey::PhotonEnergy),
        );
        state
    }

    pub fn to_record(&self) -> SelectionRecord {
        SelectionRecord {
            elements: Some(self.elements.clone()),
            photon_energies: Some(self.photon_energies.clone()),
            work_function: Some(self.work_function),
            element_multipliers: self.element_multipliers.clone(),
            energy_multipliers: self
                .energy_multipliers
                .iter()
                .map(|&(e, m)| (e.to_string(), m))
                .collect(),
            broadening: Some(self.broadening),
            width_percent: Some(self.width.percent),
            width_fixed_ev: Some(self.width.fixed_ev),
            annotations: Some(self.annotations),
            auger: Some(self.auger),
            emin: self.window.map(|w| w.emin),
            emax: self.window.map(|w| w.emax),
            photoelectron_lookup: Some(self.photoelectron_lookup),
            auger_lookup: Some(self.auger_lookup),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let record: SelectionRecord = serde_json::from_str(json)?;
        Ok(Self::from_record(&record))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record())?)
    }
}

/// Flat key-value form of [`SelectionState`] as stored by the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionRecord {
    pub elements: Option<Vec<String>>,
    pub photon_energies: Option<Vec<f64>>,
    pub work_function: Option<f64>,
    pub element_multipliers: BTreeMap<String, f64>,
    /// Keyed by the photon energy formatted as a decimal string.
    pub energy_multipliers: BTreeMap<String, f64>,
    pub broadening: Option<bool>,
    pub width_percent: Option<f64>,
    pub width_fixed_ev: Option<f64>,
    pub annotations: Option<bool>,
    pub auger: Option<bool>,
    pub emin: Option<f64>,
    pub emax: Option<f64>,
    pub photoelectron_lookup: Option<LookupKey>,
    pub auger_lookup: Option<LookupKey>,
}

fn check_photon_energy(energy: f64) -> Result<()> {
    if !energy.is_finite() || energy <= 0.0 {
        return Err(XpsError::InvalidPhotonEnergy(energy));
    }
    Ok(())
}

fn check_multiplier(value: f64) -> Result<()> {
    if !(MULTIPLIER_MIN..=MULTIPLIER_MAX).contains(&value) {
        return Err(XpsError::MultiplierOutOfRange {
            value,
            min: MULTIPLIER_MIN,
            max: MULTIPLIER_MAX,
        });
    }
    Ok(())
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    let changed = *slot != value;
    *slot = value;
    changed
}

fn absorb(state: &mut SelectionState, mutation: Mutation) {
    if let Err(e) = state.apply(mutation) {
        tracing::warn!(error = %e, "ignoring invalid persisted selection value");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = SelectionState::default();
        assert_eq!(s.elements(), ["neon"]);
        assert_eq!(s.photon_energies(), [1486.6]);
        assert_eq!(s.work_function(), 0.0);
        assert!(!s.broadening());
        assert!(s.annotations());
        assert!(s.auger());
        assert_eq!(s.element_multiplier("argon"), 1.0);
        assert_eq!(s.energy_multiplier(21.2), 1.0);
    }

    #[test]
    fn test_duplicate_insertion_is_noop() {
        let mut s = SelectionState::default();
        assert!(!s.apply(Mutation::AddElement("neon".into())).unwrap());
        assert!(s.apply(Mutation::AddElement("argon".into())).unwrap());
        assert!(!s.apply(Mutation::AddPhotonEnergy(1486.6)).unwrap());
        assert!(s.apply(Mutation::AddPhotonEnergy(1253.6)).unwrap());
        assert_eq!(s.elements(), ["neon", "argon"]);
        assert_eq!(s.photon_energies(), [1486.6, 1253.6]);
    }

    #[test]
    fn test_invalid_input_leaves_state_untouched() {
        let mut s = SelectionState::default();
        let before = s.clone();
        assert!(matches!(
            s.apply(Mutation::AddPhotonEnergy(-1.0)),
            Err(XpsError::InvalidPhotonEnergy(_))
        ));
        assert!(s.apply(Mutation::AddPhotonEnergy(f64::NAN)).is_err());
        assert!(matches!(
            s.apply(Mutation::SetElementMultiplier {
                element: "neon".into(),
                value: 1000.0
            }),
            Err(XpsError::MultiplierOutOfRange { .. })
        ));
        assert!(s.apply(Mutation::SetWorkFunction(-0.5)).is_err());
        assert!(s
            .apply(Mutation::SetBroadeningWidth {
                percent: -1.0,
                fixed_ev: 0.0
            })
            .is_err());
        assert!(s.apply(Mutation::SetEnergyWindow(Some((800.0, 0.0)))).is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn test_multipliers_resolve() {
        let mut s = SelectionState::default();
        s.apply(Mutation::SetElementMultiplier {
            element: "neon".into(),
            value: 2.0,
        })
        .unwrap();
        s.apply(Mutation::SetEnergyMultiplier {
            photon_energy: 1486.6,
            value: 0.5,
        })
        .unwrap();
        assert_eq!(s.intensity_scale("neon", 1486.6), 1.0);
        assert_eq!(s.intensity_scale("neon", 21.2), 2.0);
        assert_eq!(s.intensity_scale("argon", 1486.6), 0.5);
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let s =
            SelectionState::from_json(r#"{"elements": ["argon"], "workFunction": 4.5}"#).unwrap();
        assert_eq!(s.elements(), ["argon"]);
        assert_eq!(s.photon_energies(), [DEFAULT_PHOTON_ENERGY]);
        assert_eq!(s.work_function(), 4.5);
        assert_eq!(s.width(), BroadeningWidth::default());
        assert!(s.auger());
        assert_eq!(s.window(), None);
    }

    #[test]
    fn test_record_drops_invalid_values() {
        let s = SelectionState::from_json(
            r#"{"photonEnergies": [1486.6, -3, 21.2, 21.2], "energyMultipliers": {"21.2": 3.0, "abc": 2.0}}"#,
        )
        .unwrap();
        assert_eq!(s.photon_energies(), [1486.6, 21.2]);
        assert_eq!(s.energy_multiplier(21.2), 3.0);
    }

    #[test]
    fn test_record_round_trip() {
        let mut s = SelectionState::default();
        s.apply(Mutation::AddElement("krypton".into())).unwrap();
        s.apply(Mutation::SetBroadening(true)).unwrap();
        s.apply(Mutation::SetEnergyWindow(Some((0.0, 800.0)))).unwrap();
        s.apply(Mutation::SetEnergyMultiplier {
            photon_energy: 1486.6,
            value: 1.5,
        })
        .unwrap();
        let restored = SelectionState::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(restored, s);
    }

    #[test]
    fn test_lookup_keys_persist() {
        let mut s = SelectionState::default();
        s.set_lookup_keys(LookupKey::PhotonEnergy, LookupKey::KineticEnergy);
        let json = s.to_json().unwrap();
        assert!(json.contains(r#""photoelectronLookup""#));
        let restored = SelectionState::from_json(&json).unwrap();
        assert_eq!(restored.photoelectron_lookup(), LookupKey::PhotonEnergy);
        assert_eq!(restored.auger_lookup(), LookupKey::KineticEnergy);

        let old = SelectionState::from_json(r#"{"elements": ["neon"]}"#).unwrap();
        assert_eq!(old.photoelectron_lookup(), LookupKey::KineticEnergy);
        assert_eq!(old.auger_lookup(), LookupKey::PhotonEnergy);
    }

    #[test]
    fn test_canonicalize_merges_aliases() {
        let db = XpsDb::new();
        let mut s = SelectionState::empty();
        s.apply(Mutation::AddElement("Ne".into())).unwrap();
        s.apply(Mutation::AddElement("NEON".into())).unwrap();
        s.apply(Mutation::AddElement("unobtainium".into())).unwrap();
        s.apply(Mutation::SetElementMultiplier {
            element: "ar".into(),
            value: 3.0,
        })
        .unwrap();
        s.canonicalize(&db);
        assert_eq!(s.elements(), ["neon", "unobtainium"]);
        assert_eq!(s.element_multiplier("argon"), 3.0);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            SelectionState::from_json("{not json"),
            Err(XpsError::Config(_))
        ));
    }
}
