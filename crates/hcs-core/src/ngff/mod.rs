//! OME-NGFF 0.4 metadata models.
//!
//! Everything here is plain serde data plus the validation rules the writer
//! applies before attaching metadata to a group.

pub mod axes;
pub mod coordinate_transformations;
pub mod multiscale;
pub mod omero;
pub mod plate;
pub mod well;

pub use axes::{valid_axes, Axis, AxisType};
pub use coordinate_transformations::{validate_coordinate_transformations, CoordinateTransformation};
pub use multiscale::{Dataset, Multiscale};
pub use omero::{Omero, OmeroChannel, Window};
pub use plate::{Column, Plate, PlateLayout, Row, WellRef};
pub use well::{Well, WellImage};
