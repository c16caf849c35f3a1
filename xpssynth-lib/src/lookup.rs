//! Nearest-sample lookup into a shell's tabulated cross-sections.
//!
//! Tables are indexed by photon energy, but the photoelectron path has
//! historically been resolved by the electron's kinetic energy while the
//! Auger path uses the photon energy. Both keys are kept as separate
//! operations; [`LookupKey`] selects between them.

use serde::{Deserialize, Serialize};
use xpssynth_data::SampleTable;

use crate::constants::DEFAULT_BETA;

/// One row of a sample table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShellSample {
    pub energy: f64,
    pub cross_section: f64,
    /// `None` when the table has no β for this row.
    pub beta: Option<f64>,
}

impl ShellSample {
    pub fn beta_or_default(&self) -> f64 {
        self.beta.unwrap_or(DEFAULT_BETA)
    }
}

/// Which energy a table lookup is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKey {
    KineticEnergy,
    PhotonEnergy,
}

/// Row whose energy is closest to `target`.
///
/// Ties go to the lowest index. Rows with a non-finite energy are ignored.
/// Returns `None` for an empty table.
pub fn nearest_sample(table: &SampleTable, target: f64) -> Option<ShellSample> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &energy) in table.photon_energy[..table.len()].iter().enumerate() {
        if !energy.is_finite() {
            continue;
        }
        let diff = (energy - target).abs();
        if best.is_none_or(|(_, d)| diff < d) {
            best = Some((i, diff));
        }
    }

    best.map(|(i, _)| ShellSample {
        energy: table.photon_energy[i],
        cross_section: table.cross_section[i],
        beta: table.beta.get(i).copied().filter(|b| b.is_finite()),
    })
}

/// Lookup keyed by the photoelectron's kinetic energy.
pub fn sample_at_kinetic_energy(table: &SampleTable, kinetic_energy: f64) -> Option<ShellSample> {
    nearest_sample(table, kinetic_energy)
}

/// Lookup keyed directly by the photon energy.
pub fn sample_at_photon_energy(table: &SampleTable, photon_energy: f64) -> Option<ShellSample> {
    nearest_sample(table, photon_energy)
}

/// Dispatch on `key`, given both candidate energies.
pub fn sample_for(
    table: &SampleTable,
    key: LookupKey,
    kinetic_energy: f64,
    photon_energy: f64,
) -> Option<ShellSample> {
    match key {
        LookupKey::KineticEnergy => sample_at_kinetic_energy(table, kinetic_energy),
        LookupKey::PhotonEnergy => sample_at_photon_energy(table, photon_energy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SampleTable {
        SampleTable {
            photon_energy: vec![10.0, 20.0, 30.0],
            cross_section: vec![1.0, 2.0, 3.0],
            beta: vec![0.5, 1.0],
        }
    }

    #[test]
    fn test_nearest_prefers_closest() {
        let s = nearest_sample(&table(), 21.0).unwrap();
        assert_eq!(s.energy, 20.0);
        assert_eq!(s.cross_section, 2.0);
        assert_eq!(s.beta, Some(1.0));
    }

    #[test]
    fn test_nearest_tie_goes_to_first() {
        assert_eq!(nearest_sample(&table(), 15.0).unwrap().energy, 10.0);
        assert_eq!(nearest_sample(&table(), 25.0).unwrap().energy, 20.0);
    }

    #[test]
    fn test_nearest_unsorted_table() {
        let t = SampleTable {
            photon_energy: vec![500.0, 100.0, 1000.0, 200.0],
            cross_section: vec![0.5, 1.0, 0.3, 0.8],
            beta: vec![],
        };
        let s = nearest_sample(&t, 180.0).unwrap();
        assert_eq!(s.energy, 200.0);
        assert_eq!(s.beta, None);
        assert_eq!(s.beta_or_default(), DEFAULT_BETA);
    }

    #[test]
    fn test_nearest_clamps_outside_range() {
        assert_eq!(nearest_sample(&table(), -5.0).unwrap().energy, 10.0);
        assert_eq!(nearest_sample(&table(), 1e6).unwrap().energy, 30.0);
    }

    #[test]
    fn test_empty_and_ragged_tables() {
        assert!(nearest_sample(&SampleTable::default(), 1.0).is_none());

        // Only the first row has a cross-section
        let ragged = SampleTable {
            photon_energy: vec![10.0, 20.0],
            cross_section: vec![4.0],
            beta: vec![],
        };
        assert_eq!(nearest_sample(&ragged, 20.0).unwrap().cross_section, 4.0);
    }

    #[test]
    fn test_keyed_lookups_differ() {
        let t = table();
        let by_ke = sample_for(&t, LookupKey::KineticEnergy, 11.0, 29.0).unwrap();
        let by_hv = sample_for(&t, LookupKey::PhotonEnergy, 11.0, 29.0).unwrap();
        assert_eq!(by_ke.energy, 10.0);
        assert_eq!(by_hv.energy, 30.0);
    }
}
