pub mod broaden;
pub(crate) mod builtin;
pub mod constants;
pub mod db;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod layout;
pub mod lookup;
pub mod selection;
pub mod series;
pub mod synth;

pub use broaden::{BroadenedCurve, EnergyGrid, GridConfig, GroupKey};
pub use db::XpsDb;
pub use debounce::Debouncer;
pub use engine::{EngineConfig, Frame, LayoutStatus, RenderSink, RendererEvent, SpectrumEngine};
pub use error::{Result, XpsError};
pub use layout::{AxisGeometry, AxisMapping, FixedCharMetrics, LabelBox, LabelMeasure, LabelSize};
pub use lookup::{LookupKey, ShellSample};
pub use selection::{BroadeningWidth, EnergyWindow, Mutation, SelectionRecord, SelectionState};
pub use series::{Series, SeriesId, SeriesKind};
pub use synth::{Peak, PeakKind};
pub use xpssynth_data;
