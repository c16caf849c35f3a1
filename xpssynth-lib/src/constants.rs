/// FWHM of a Gaussian in units of its standard deviation, 2√(2 ln 2).
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949;

/// Asymmetry parameter used when a sample table carries no β for a row.
pub const DEFAULT_BETA: f64 = 1.5;

/// Al Kα line (eV)
pub const AL_K_ALPHA: f64 = 1486.6;

/// Mg Kα line (eV)
pub const MG_K_ALPHA: f64 = 1253.6;

/// He I resonance line (eV)
pub const HE_I: f64 = 21.2;

/// He II resonance line (eV)
pub const HE_II: f64 = 40.8;

/// Photon energy presets offered by the UI, as (name, eV).
pub const PHOTON_ENERGY_PRESETS: &[(&str, f64)] = &[
    ("Al Kα", AL_K_ALPHA),
    ("Mg Kα", MG_K_ALPHA),
    ("He I", HE_I),
    ("He II", HE_II),
];
