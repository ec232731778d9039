//! Plate conversion: stitch each well, bin, persist level 0, build the
//! pyramid and write the NGFF metadata.

mod binning;
pub mod config;
mod converter;
mod pyramid;
mod types;

pub use binning::bin_yx;
pub use config::{ConversionConfig, FuseMethod, NgffPlate, RunConfig, WarpMethod};
pub use converter::ConvertToNgffPlate;
pub use pyramid::build_pyramid;
pub use types::{ConversionStage, ProgressReporter, PyramidLevel, WellOutput};
