//! Built-in shell table for the noble gases shipped with the web UI.
//!
//! Binding energies are tabulated values in eV. Shells without a tabulated
//! cross-section file use [`SampleTable::placeholder`], split between
//! spin-orbit components by statistical weight. Load a generator blob with
//! [`crate::XpsDb::from_compressed`] to use real cross-sections.

use xpssynth_data::{
    AugerRecord, ElementRecord, SampleTable, ShellDatabase, ShellRecord, VersionRecord,
    spin_orbit_fraction,
};

const NEON_SHELLS: &[(&str, f64)] = &[
    ("1s", 870.2),
    ("2s", 48.5),
    ("2p1/2", 21.7),
    ("2p3/2", 21.6),
];

const NEON_KLL: &[(&str, f64, f64)] = &[
    ("1s2-", 748.0, 0.08),
    ("2s1- 2p1-", 782.0, 0.25),
    ("2p2-", 804.0, 0.65),
];

const ARGON_SHELLS: &[(&str, f64)] = &[
    ("L1 2s", 326.3),
    ("L2 2p1/2", 250.6),
    ("L3 2p3/2", 248.4),
    ("M1 3s", 29.3),
    ("M2 3p1/2", 15.9),
    ("M3 3p3/2", 15.7),
];

const KRYPTON_SHELLS: &[(&str, f64)] = &[
    ("3s", 292.8),
    ("3p1/2", 222.2),
    ("3p3/2", 214.4),
    ("3d3/2", 95.0),
    ("3d5/2", 93.8),
    ("4s", 27.5),
    ("4p1/2", 14.1),
    ("4p3/2", 14.1),
];

const XENON_SHELLS: &[(&str, f64)] = &[
    ("M1 3s", 1148.7),
    ("M2 3p1/2", 1002.1),
    ("M3 3p3/2", 940.6),
    ("M4 3d3/2", 689.0),
    ("M5 3d5/2", 676.4),
    ("N1 4s", 213.2),
    ("N2 4p1/2", 146.7),
    ("N3 4p3/2", 145.5),
    ("N4 4d3/2", 69.5),
    ("N5 4d5/2", 67.5),
    ("O1 5s", 23.3),
    ("O2 5p1/2", 13.4),
    ("O3 5p3/2", 12.1),
];

pub(crate) fn builtin_database() -> ShellDatabase {
    let neon_auger = NEON_KLL
        .iter()
        .map(|&(name, kinetic_energy, intensity_factor)| AugerRecord {
            origin_shell: "1s".to_string(),
            kinetic_energy,
            intensity_factor,
            channel: "KLL".to_string(),
            name: name.to_string(),
        })
        .collect();

    ShellDatabase {
        version: vec![VersionRecord {
            tag: "builtin".to_string(),
            date: "2025-01-01".to_string(),
            notes: "noble gas binding energies, placeholder cross-sections".to_string(),
        }],
        elements: vec![
            element("neon", "Neon", "Ne", NEON_SHELLS, neon_auger),
            element("argon", "Argon", "Ar", ARGON_SHELLS, Vec::new()),
            element("krypton", "Krypton", "Kr", KRYPTON_SHELLS, Vec::new()),
            element("xenon", "Xenon", "Xe", XENON_SHELLS, Vec::new()),
        ],
    }
}

fn element(
    key: &str,
    name: &str,
    symbol: &str,
    shells: &[(&str, f64)],
    auger: Vec<AugerRecord>,
) -> ElementRecord {
    let base = SampleTable::placeholder();
    ElementRecord {
        key: key.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        shells: shells
            .iter()
            .map(|&(name, binding_energy)| ShellRecord {
                name: name.to_string(),
                binding_energy,
            })
            .collect(),
        samples: shells
            .iter()
            .map(|&(name, _)| base.scaled(spin_orbit_fraction(name)))
            .collect(),
        auger,
    }
}
