#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

/// The complete shell database, deserialized from a generator blob or built in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellDatabase {
    pub version: Vec<VersionRecord>,
    pub elements: Vec<ElementRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRecord {
    pub tag: String,
    pub date: String,
    pub notes: String,
}

/// One element: ordered shells, their sample tables and optional Auger lines.
///
/// `samples` is index-aligned with `shells`. When it is shorter, the last
/// table is reused for the remaining shells (see [`ElementRecord::samples_for`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRecord {
    pub key: String,
    pub name: String,
    pub symbol: String,
    pub shells: Vec<ShellRecord>,
    pub samples: Vec<SampleTable>,
    pub auger: Vec<AugerRecord>,
}

impl ElementRecord {
    /// Sample table for the shell at `index`, reusing the last table when
    /// fewer tables than shells exist.
    pub fn samples_for(&self, index: usize) -> Option<&SampleTable> {
        self.samples.get(index).or_else(|| self.samples.last())
    }

    /// Position of a shell by name.
    pub fn shell_index(&self, shell: &str) -> Option<usize> {
        self.shells.iter().position(|s| s.name == shell)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellRecord {
    pub name: String,
    /// Binding energy in eV.
    pub binding_energy: f64,
}

/// Tabulated photoionization samples for one shell.
///
/// The three sequences are parallel. `beta` may be shorter than the others
/// (or empty) when the source table had no asymmetry column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleTable {
    pub photon_energy: Vec<f64>,
    /// Cross-section in Mb.
    pub cross_section: Vec<f64>,
    pub beta: Vec<f64>,
}

impl SampleTable {
    /// Coarse four-point table used for shells without tabulated data.
    pub fn placeholder() -> SampleTable {
        SampleTable {
            photon_energy: alloc::vec![100.0, 200.0, 500.0, 1000.0],
            cross_section: alloc::vec![1.0, 0.8, 0.5, 0.3],
            beta: alloc::vec![1.5, 1.4, 1.3, 1.2],
        }
    }

    /// Number of usable rows: both an energy and a cross-section are present.
    pub fn len(&self) -> usize {
        self.photon_energy.len().min(self.cross_section.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy with every cross-section multiplied by `factor`. β is an angular
    /// distribution parameter and is left alone.
    pub fn scaled(&self, factor: f64) -> SampleTable {
        SampleTable {
            photon_energy: self.photon_energy.clone(),
            cross_section: self.cross_section.iter().map(|cs| cs * factor).collect(),
            beta: self.beta.clone(),
        }
    }
}

/// An Auger line fed by a core hole in `origin_shell`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugerRecord {
    pub origin_shell: String,
    /// Kinetic energy in eV. Independent of the photon energy.
    pub kinetic_energy: f64,
    /// Intensity relative to the origin shell's cross-section.
    pub intensity_factor: f64,
    /// Channel, e.g. "KLL".
    pub channel: String,
    /// Final-state name, e.g. "2p2-".
    pub name: String,
}

/// Statistical weight of one spin-orbit component within its subshell.
///
/// A `p` table covers both `p1/2` (2 states) and `p3/2` (4 states), so each
/// component receives `(2j + 1) / (2(2l + 1))` of the tabulated cross-section.
/// Labels without a `j` suffix get the full weight.
pub fn spin_orbit_fraction(shell: &str) -> f64 {
    let label = shell.rsplit(' ').next().unwrap_or(shell);
    if label.ends_with("p1/2") {
        1.0 / 3.0
    } else if label.ends_with("p3/2") {
        2.0 / 3.0
    } else if label.ends_with("d3/2") {
        2.0 / 5.0
    } else if label.ends_with("d5/2") {
        3.0 / 5.0
    } else if label.ends_with("f5/2") {
        3.0 / 7.0
    } else if label.ends_with("f7/2") {
        4.0 / 7.0
    } else {
        1.0
    }
}
