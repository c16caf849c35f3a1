use approx::assert_relative_eq;
use xpssynth::xpssynth_data::{
    AugerRecord, ElementRecord, SampleTable, ShellDatabase, ShellRecord,
};
use xpssynth::{LookupKey, Mutation, PeakKind, SelectionState, XpsDb, XpsError};

fn single_shell_neon() -> XpsDb {
    XpsDb::from_database(ShellDatabase {
        version: Vec::new(),
        elements: vec![ElementRecord {
            key: "neon".to_string(),
            name: "Neon".to_string(),
            symbol: "Ne".to_string(),
            shells: vec![ShellRecord {
                name: "1s".to_string(),
                binding_energy: 870.2,
            }],
            samples: vec![SampleTable {
                photon_energy: vec![1486.6],
                cross_section: vec![0.05],
                beta: vec![1.9],
            }],
            auger: Vec::new(),
        }],
    })
}

/// Neon 1s with a row near its kinetic energy at Al Kα (616.4 eV) and a
/// row at the photon energy itself, plus one KLL line.
fn two_row_neon() -> ShellDatabase {
    ShellDatabase {
        version: Vec::new(),
        elements: vec![ElementRecord {
            key: "neon".to_string(),
            name: "Neon".to_string(),
            symbol: "Ne".to_string(),
            shells: vec![ShellRecord {
                name: "1s".to_string(),
                binding_energy: 870.2,
            }],
            samples: vec![SampleTable {
                photon_energy: vec![600.0, 1486.6],
                cross_section: vec![0.2, 0.05],
                beta: vec![1.0, 1.9],
            }],
            auger: vec![AugerRecord {
                origin_shell: "1s".to_string(),
                kinetic_energy: 804.0,
                intensity_factor: 0.5,
                channel: "KLL".to_string(),
                name: "2p2-".to_string(),
            }],
        }],
    }
}

fn selection(mutations: Vec<Mutation>) -> SelectionState {
    let mut s = SelectionState::default();
    for m in mutations {
        s.apply(m).unwrap();
    }
    s
}

#[test]
fn test_single_shell_peak() {
    let db = single_shell_neon();
    let peaks = db.synthesize(&SelectionState::default());
    assert_eq!(peaks.len(), 1);
    let p = &peaks[0];
    assert_eq!(p.label, "1s");
    assert_relative_eq!(p.kinetic_energy, 616.4, epsilon = 1e-9);
    assert_relative_eq!(p.intensity, 0.05);
    assert_relative_eq!(p.beta, 1.9);
    assert_relative_eq!(p.binding_energy, 870.2);
    assert_eq!(p.kind, PeakKind::Photoelectron);
}

#[test]
fn test_multipliers_compose() {
    let db = single_shell_neon();
    let s = selection(vec![
        Mutation::SetElementMultiplier {
            element: "neon".into(),
            value: 2.0,
        },
        Mutation::SetEnergyMultiplier {
            photon_energy: 1486.6,
            value: 0.5,
        },
    ]);
    let peaks = db.synthesize(&s);
    assert_relative_eq!(peaks[0].intensity, 0.05);
}

#[test]
fn test_builtin_neon_intensities() {
    let db = XpsDb::new();
    let peaks = db.synthesize(&SelectionState::default());
    assert_eq!(peaks.len(), 7);

    // Placeholder table, nearest row by kinetic energy
    assert_relative_eq!(peaks[0].intensity, 0.5);
    assert_relative_eq!(peaks[1].intensity, 0.3);
    assert_relative_eq!(peaks[2].intensity, 0.1);
    assert_relative_eq!(peaks[3].intensity, 0.2);

    // Auger lines: origin 1s sampled at the photon energy row
    assert_eq!(peaks[4].origin_shell(), Some("1s"));
    assert_relative_eq!(peaks[4].kinetic_energy, 748.0);
    assert_relative_eq!(peaks[4].intensity, 0.3 * 0.08);
    assert_relative_eq!(peaks[6].intensity, 0.3 * 0.65);
    assert!(peaks[4..].iter().all(|p| p.beta == 0.0));
}

#[test]
fn test_peak_exists_iff_kinetic_energy_positive() {
    let db = XpsDb::new();
    let mut s = SelectionState::empty();
    s.apply(Mutation::AddElement("argon".into())).unwrap();
    s.apply(Mutation::AddPhotonEnergy(21.2)).unwrap();

    for wf in [0.0, 2.0, 5.4, 5.6, 10.0] {
        s.apply(Mutation::SetWorkFunction(wf)).unwrap();
        let peaks = db.synthesize(&s);
        let record = db.element("argon").unwrap();
        let expected = record
            .shells
            .iter()
            .filter(|sh| 21.2 - sh.binding_energy - wf > 0.0)
            .count();
        assert_eq!(peaks.len(), expected, "work function {wf}");
        assert!(peaks.iter().all(|p| p.kinetic_energy > 0.0));
    }
}

#[test]
fn test_element_multiplier_is_linear() {
    let db = XpsDb::new();
    let base = db.synthesize(&SelectionState::default());
    for k in [0.0, 0.25, 3.0, 100.0] {
        let s = selection(vec![Mutation::SetElementMultiplier {
            element: "neon".into(),
            value: k,
        }]);
        let scaled = db.synthesize(&s);
        assert_eq!(scaled.len(), base.len());
        for (a, b) in base.iter().zip(&scaled) {
            assert_relative_eq!(b.intensity, a.intensity * k);
            assert_eq!(a.kinetic_energy, b.kinetic_energy);
        }
    }
}

#[test]
fn test_auger_count_monotone_in_photon_energy() {
    let db = XpsDb::new();
    let mut last = 0;
    for hv in [21.2, 500.0, 870.2, 870.3, 1253.6, 1486.6, 3000.0] {
        let mut s = SelectionState::empty();
        s.apply(Mutation::AddElement("neon".into())).unwrap();
        s.apply(Mutation::AddPhotonEnergy(hv)).unwrap();
        let count = db.synthesize(&s).iter().filter(|p| p.is_auger()).count();
        assert!(count >= last, "Auger lines vanished at {hv} eV");
        last = count;
    }
    assert_eq!(last, 3);
}

#[test]
fn test_auger_kinetic_energy_independent_of_photon_energy() {
    let db = XpsDb::new();
    let mut s = SelectionState::empty();
    s.apply(Mutation::AddElement("neon".into())).unwrap();
    s.apply(Mutation::AddPhotonEnergy(1253.6)).unwrap();
    s.apply(Mutation::AddPhotonEnergy(1486.6)).unwrap();
    let auger: Vec<f64> = db
        .synthesize(&s)
        .iter()
        .filter(|p| p.is_auger())
        .map(|p| p.kinetic_energy)
        .collect();
    assert_eq!(auger, [748.0, 782.0, 804.0, 748.0, 782.0, 804.0]);
}

#[test]
fn test_window_filters_both_kinds() {
    let db = XpsDb::new();
    let s = selection(vec![Mutation::SetEnergyWindow(Some((700.0, 790.0)))]);
    let labels: Vec<String> = db.synthesize(&s).into_iter().map(|p| p.label).collect();
    assert_eq!(labels, ["1s2-", "2s1- 2p1-"]);
}

#[test]
fn test_identifier_resolution() {
    let db = XpsDb::new();
    assert_eq!(db.resolve_element("Ne").unwrap(), "neon");
    assert_eq!(db.resolve_element("XENON").unwrap(), "xenon");
    assert_relative_eq!(db.binding_energy("kr", "3d5/2").unwrap(), 93.8);
    assert!(matches!(
        db.binding_energy("neon", "9z"),
        Err(XpsError::UnknownShell { .. })
    ));
    assert!(matches!(
        db.element("unobtainium"),
        Err(XpsError::UnknownElement(_))
    ));
}

#[test]
fn test_spin_orbit_split_in_builtin_tables() {
    let db = XpsDb::new();
    let half = db.shell_samples("argon", "L2 2p1/2").unwrap();
    let three_halves = db.shell_samples("argon", "L3 2p3/2").unwrap();
    for (a, b) in half.cross_section.iter().zip(&three_halves.cross_section) {
        assert_relative_eq!(b / a, 2.0, epsilon = 1e-12);
    }
    assert_eq!(half.beta, three_halves.beta);
}

#[test]
fn test_garbage_blob_is_data_error() {
    assert!(matches!(
        XpsDb::from_compressed(b"definitely not zstd"),
        Err(XpsError::DataError(_))
    ));
}

#[test]
fn test_compressed_blob_loads() {
    let serialized = postcard::to_allocvec(&two_row_neon()).unwrap();
    let compressed = zstd::encode_all(&serialized[..], 19).unwrap();
    let db = XpsDb::from_compressed(&compressed).unwrap();
    assert_eq!(db.element_keys(), ["neon"]);

    let peaks = db.synthesize(&SelectionState::default());
    assert_eq!(peaks.len(), 2);
    assert_eq!(peaks[0].label, "1s");
    assert_relative_eq!(peaks[0].kinetic_energy, 616.4, epsilon = 1e-9);
    assert_relative_eq!(peaks[0].intensity, 0.2);
    assert_eq!(peaks[1].label, "2p2-");
    assert_relative_eq!(peaks[1].intensity, 0.025);
}

#[test]
fn test_photoelectron_lookup_key_selects_row() {
    let db = XpsDb::from_database(two_row_neon());
    let mut s = selection(vec![Mutation::SetAuger(false)]);
    let by_kinetic = db.synthesize(&s);
    assert_relative_eq!(by_kinetic[0].intensity, 0.2);
    assert_relative_eq!(by_kinetic[0].beta, 1.0);

    s.set_lookup_keys(LookupKey::PhotonEnergy, LookupKey::PhotonEnergy);
    let by_photon = db.synthesize(&s);
    assert_relative_eq!(by_photon[0].intensity, 0.05);
    assert_relative_eq!(by_photon[0].beta, 1.9);
    assert_relative_eq!(by_photon[0].kinetic_energy, by_kinetic[0].kinetic_energy);
}

#[test]
fn test_auger_lookup_key_selects_row() {
    let db = XpsDb::from_database(two_row_neon());
    let mut s = SelectionState::default();
    let auger = |peaks: Vec<xpssynth::Peak>| peaks.into_iter().find(|p| p.is_auger()).unwrap();

    let by_photon = auger(db.synthesize(&s));
    assert_relative_eq!(by_photon.intensity, 0.05 * 0.5);

    s.set_lookup_keys(LookupKey::KineticEnergy, LookupKey::KineticEnergy);
    let by_kinetic = auger(db.synthesize(&s));
    assert_relative_eq!(by_kinetic.intensity, 0.2 * 0.5);
    assert_relative_eq!(by_kinetic.kinetic_energy, 804.0);
}
