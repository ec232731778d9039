//! Acquisition model: plates, wells and lazily loaded, corrected tiles.

pub mod manifest;
mod plate;
mod tile;
mod well;

pub use manifest::AcquisitionManifest;
pub use plate::{ChannelMetadata, PlateAcquisition};
pub use tile::{CorrectionMatrix, Tile, TilePosition};
pub use well::{split_well_name, PixelSpacing, WellAcquisition, WELL_AXES};
