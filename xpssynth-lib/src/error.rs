#[derive(Debug, thiserror::Error)]
pub enum XpsError {
    #[error("unknown element: {0}")]
    UnknownElement(String),
    #[error("unknown shell '{shell}' for element '{element}'")]
    UnknownShell { element: String, shell: String },
    #[error("photon energy must be a positive number, got {0}")]
    InvalidPhotonEnergy(f64),
    #[error("multiplier {value} out of range [{min}, {max}]")]
    MultiplierOutOfRange { value: f64, min: f64, max: f64 },
    #[error("work function must be a non-negative number, got {0}")]
    InvalidWorkFunction(f64),
    #[error("invalid broadening width: {percent} % + {fixed_ev} eV")]
    InvalidWidth { percent: f64, fixed_ev: f64 },
    #[error("invalid energy window [{emin}, {emax}]")]
    InvalidEnergyWindow { emin: f64, emax: f64 },
    #[error("invalid selection record: {0}")]
    Config(#[from] serde_json::Error),
    #[error("data error: {0}")]
    DataError(String),
}

pub type Result<T> = std::result::Result<T, XpsError>;
