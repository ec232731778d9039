//! Stitching and pyramid engine for high-content-screening plates.
//!
//! A [`acquisition::PlateAcquisition`] describes wells made of overlapping
//! tiles. [`convert::ConvertToNgffPlate`] stitches every well into one lazy
//! image, persists it as a chunked Zarr array, derives a resolution pyramid
//! from the persisted data and writes OME-NGFF 0.4 plate, well and multiscale
//! metadata.

pub mod acquisition;
pub mod consts;
pub mod convert;
pub mod element;
pub mod error;
pub mod executor;
pub mod lazy;
pub mod ngff;
pub mod stitch;
pub mod store;
