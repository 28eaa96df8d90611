//! Spectral data containers with unit-aware axes, intensity representations,
//! dynamic baselines and generalized 2D correlation analysis.

pub mod axis;
pub mod baseline;
pub mod config;
pub mod corr2d;
pub mod data_container;
pub mod error;
pub mod intensity;
pub mod math_tools;
pub mod units;

pub use axis::ConvertibleAxis;
pub use baseline::{dynamic_baseline, BaselineRegion};
pub use config::{Corr2dConfig, ScalingConfig};
pub use corr2d::{Corr2dEngine, Corr2dResult};
pub use data_container::{Spectra, VariableAxis};
pub use error::{Result, SpectraError};
pub use intensity::{IntensityTable, IntensityUnit};
pub use units::{Unit, UnitCategory, UnitTable};
