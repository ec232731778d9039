use std::fmt::Debug;

use image::DynamicImage;
use ndarray::Array2;
use num_traits::{Bounded, NumCast, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use zarrs::array::{Element as ZarrElement, ElementOwned};

use crate::error::{HcsError, Result};

/// Pixel data type of an acquisition and of every array written for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Uint8,
    Uint16,
    Float32,
}

impl DataType {
    /// Zarr v2 dtype string (NumPy array-protocol typestr).
    pub fn zarr_dtype(&self) -> &'static str {
        match self {
            Self::Uint8 => "|u1",
            Self::Uint16 => "<u2",
            Self::Float32 => "<f4",
        }
    }

    pub fn from_zarr_dtype(dtype: &str) -> Option<Self> {
        match dtype {
            "|u1" | "<u1" => Some(Self::Uint8),
            "<u2" => Some(Self::Uint16),
            "<f4" => Some(Self::Float32),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uint8 => write!(f, "uint8"),
            Self::Uint16 => write!(f, "uint16"),
            Self::Float32 => write!(f, "float32"),
        }
    }
}

/// Element type of tiles, stitched images and stored arrays.
///
/// Arithmetic (means, corrections, blending) happens in floating point;
/// results are cast back with [`Element::from_f64_saturating`], which
/// truncates towards zero and clamps to the type's range like a NumPy
/// `astype` of an in-range value.
pub trait Element:
    Copy
    + Default
    + PartialEq
    + Debug
    + Send
    + Sync
    + NumCast
    + ToPrimitive
    + Bounded
    + Zero
    + ZarrElement
    + ElementOwned
    + 'static
{
    const DTYPE: DataType;

    fn as_f64(self) -> f64 {
        self.to_f64().unwrap_or(0.0)
    }

    fn from_f64_saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self::zero();
        }
        let min = Self::min_value().to_f64().unwrap_or(f64::MIN);
        let max = Self::max_value().to_f64().unwrap_or(f64::MAX);
        NumCast::from(value.clamp(min, max)).unwrap_or_default()
    }
}

impl Element for u8 {
    const DTYPE: DataType = DataType::Uint8;
}

impl Element for u16 {
    const DTYPE: DataType = DataType::Uint16;
}

impl Element for f32 {
    const DTYPE: DataType = DataType::Float32;

    fn from_f64_saturating(value: f64) -> Self {
        value as f32
    }
}

/// Raw samples of a decoded image as a (height, width) plane of `T`.
///
/// Sample values are kept as stored in the file and cast to `T`; an 8-bit
/// file read into a `u16` plane keeps its 0..=255 values. Colour images are
/// reduced to luma at their own bit depth.
pub fn plane_from_image<T: Element>(img: &DynamicImage) -> Result<Array2<T>> {
    let color = img.color();
    let (w, h) = (img.width() as usize, img.height() as usize);
    let raw: Vec<T> = match color.bytes_per_pixel() / color.channel_count() {
        1 => cast_samples(img.to_luma8().into_raw()),
        2 => cast_samples(img.to_luma16().into_raw()),
        _ => cast_samples(img.to_luma32f().into_raw()),
    };
    Array2::from_shape_vec((h, w), raw)
        .map_err(|e| HcsError::config(format!("image buffer does not match its dimensions: {e}")))
}

fn cast_samples<S: Into<f64>, T: Element>(raw: Vec<S>) -> Vec<T> {
    raw.into_iter().map(|v| T::from_f64_saturating(v.into())).collect()
}
