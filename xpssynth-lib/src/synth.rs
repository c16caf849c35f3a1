use serde::Serialize;
use xpssynth_data::ElementRecord;

use crate::db::XpsDb;
use crate::lookup::sample_for;
use crate::selection::SelectionState;

/// Photoelectron or Auger origin of a peak.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeakKind {
    Photoelectron,
    Auger { origin_shell: String },
}

/// A discrete line of the synthesized spectrum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peak {
    pub element: String,
    pub photon_energy: f64,
    /// Shell name, or Auger final-state name.
    pub label: String,
    /// Kinetic energy in eV (x).
    pub kinetic_energy: f64,
    /// Scaled cross-section in Mb (y).
    pub intensity: f64,
    /// Binding energy of the shell; for Auger peaks, of the origin shell.
    pub binding_energy: f64,
    /// Asymmetry parameter, 0 for Auger peaks.
    pub beta: f64,
    pub kind: PeakKind,
}

impl Peak {
    pub fn is_auger(&self) -> bool {
        matches!(self.kind, PeakKind::Auger { .. })
    }

    pub fn origin_shell(&self) -> Option<&str> {
        match &self.kind {
            PeakKind::Auger { origin_shell } => Some(origin_shell),
            PeakKind::Photoelectron => None,
        }
    }
}

impl XpsDb {
    /// Discrete peaks for every selected (photon energy, element) pair.
    ///
    /// Photon energies form the outer loop and elements the inner one, so
    /// the output order is stable for a given selection. Unknown elements and
    /// shells without usable samples produce no peaks.
    pub fn synthesize(&self, selection: &SelectionState) -> Vec<Peak> {
        let mut peaks = Vec::new();
        for &photon_energy in selection.photon_energies() {
            for key in selection.elements() {
                match self.element(key) {
                    Ok(record) => {
                        synthesize_group(record, key, photon_energy, selection, &mut peaks)
                    }
                    Err(e) => tracing::warn!(element = %key, error = %e, "skipping element"),
                }
            }
        }
        peaks
    }
}

fn synthesize_group(
    record: &ElementRecord,
    key: &str,
    photon_energy: f64,
    selection: &SelectionState,
    peaks: &mut Vec<Peak>,
) {
    let scale = selection.intensity_scale(key, photon_energy);
    let work_function = selection.work_function();
    let in_window = |energy: f64| selection.window().is_none_or(|w| w.contains(energy));

    for (i, shell) in record.shells.iter().enumerate() {
        let kinetic_energy = photon_energy - shell.binding_energy - work_function;
        if kinetic_energy.is_nan() || kinetic_energy <= 0.0 || !in_window(kinetic_energy) {
            continue;
        }
        let Some(table) = record.samples_for(i) else {
            tracing::debug!(element = %key, shell = %shell.name, "no sample table");
            continue;
        };
        let Some(sample) = sample_for(
            table,
            selection.photoelectron_lookup(),
            kinetic_energy,
            photon_energy,
        ) else {
            tracing::debug!(element = %key, shell = %shell.name, "empty sample table");
            continue;
        };
        if !sample.cross_section.is_finite() {
            continue;
        }

        peaks.push(Peak {
            element: key.to_string(),
            photon_energy,
            label: shell.name.clone(),
            kinetic_energy,
            intensity: sample.cross_section * scale,
            binding_energy: shell.binding_energy,
            beta: sample.beta_or_default(),
            kind: PeakKind::Photoelectron,
        });
    }

    if !selection.auger() {
        return;
    }

    for line in &record.auger {
        let Some(origin) = record.shell_index(&line.origin_shell) else {
            tracing::debug!(element = %key, shell = %line.origin_shell, "unknown Auger origin shell");
            continue;
        };
        let binding_energy = record.shells[origin].binding_energy;
        // The origin core hole must be reachable at this photon energy
        let threshold = binding_energy + work_function;
        if threshold.is_nan() || photon_energy <= threshold || !in_window(line.kinetic_energy) {
            continue;
        }
        let Some(sample) = record.samples_for(origin).and_then(|table| {
            sample_for(
                table,
                selection.auger_lookup(),
                photon_energy - threshold,
                photon_energy,
            )
        }) else {
            continue;
        };
        if !sample.cross_section.is_finite() {
            continue;
        }

        peaks.push(Peak {
            element: key.to_string(),
            photon_energy,
            label: line.name.clone(),
            kinetic_energy: line.kinetic_energy,
            intensity: sample.cross_section * line.intensity_factor * scale,
            binding_energy,
            beta: 0.0,
            kind: PeakKind::Auger {
                origin_shell: line.origin_shell.clone(),
            },
        });
    }
}
