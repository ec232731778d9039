use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::PYRAMID_FACTOR;
use crate::element::Element;
use crate::error::{HcsError, Result};
use crate::ngff::CoordinateTransformation;

use super::plate::ChannelMetadata;
use super::tile::Tile;

/// Axis labels of a full well image.
pub const WELL_AXES: [&str; 5] = ["t", "c", "z", "y", "x"];

/// Physical size of one pixel along Z, Y and X (micrometer).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelSpacing {
    pub z: f64,
    pub y: f64,
    pub x: f64,
}

impl Default for PixelSpacing {
    fn default() -> Self {
        Self { z: 1.0, y: 1.0, x: 1.0 }
    }
}

/// All tiles of one well plus what is needed to describe them physically.
#[derive(Clone, Debug)]
pub struct WellAcquisition<T: Element> {
    name: String,
    tiles: Vec<Tile<T>>,
    spacing: PixelSpacing,
    origin: Option<[f64; 3]>,
    channels: BTreeMap<String, ChannelMetadata>,
}

impl<T: Element> WellAcquisition<T> {
    /// `name` is the well name, e.g. `E07`.
    pub fn new(
        name: impl Into<String>,
        tiles: Vec<Tile<T>>,
        spacing: PixelSpacing,
        channels: BTreeMap<String, ChannelMetadata>,
    ) -> Result<Self> {
        let name = name.into();
        split_well_name(&name)?;
        Ok(Self {
            name,
            tiles,
            spacing,
            origin: None,
            channels,
        })
    }

    /// Stage position (z, y, x in micrometer) of the well image origin. When
    /// set, every level gets a `translation` after its `scale`.
    pub fn with_origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tiles(&self) -> &[Tile<T>] {
        &self.tiles
    }

    pub fn spacing(&self) -> &PixelSpacing {
        &self.spacing
    }

    pub fn channels(&self) -> &BTreeMap<String, ChannelMetadata> {
        &self.channels
    }

    /// Row and column of the well: `E07` -> (`E`, `07`).
    pub fn row_col(&self) -> (String, String) {
        // validated in `new`
        let split = self.name.find(|c: char| c.is_ascii_digit()).unwrap_or(self.name.len());
        (self.name[..split].to_string(), self.name[split..].to_string())
    }

    /// Axis labels of the well image, restricted to `kept` axis indices.
    pub fn axes(&self, kept: &[usize]) -> Vec<String> {
        kept.iter().map(|&a| WELL_AXES[a].to_string()).collect()
    }

    /// One transformation list per level `0..=max_layer`.
    ///
    /// Level `l` scales Y/X by `spacing * yx_binning * 2^l`; Z keeps the z
    /// spacing and t/c are 1. `kept` selects which of the five well axes
    /// the written image still has.
    pub fn coordinate_transformations(
        &self,
        max_layer: usize,
        yx_binning: usize,
        kept: &[usize],
    ) -> Vec<Vec<CoordinateTransformation>> {
        (0..=max_layer)
            .map(|level| {
                let factor = (yx_binning * PYRAMID_FACTOR.pow(level as u32)) as f64;
                let full_scale = [
                    1.0,
                    1.0,
                    self.spacing.z,
                    self.spacing.y * factor,
                    self.spacing.x * factor,
                ];
                let mut list = vec![CoordinateTransformation::scale(
                    kept.iter().map(|&a| full_scale[a]).collect(),
                )];
                if let Some([z, y, x]) = self.origin {
                    let full_translation = [0.0, 0.0, z, y, x];
                    list.push(CoordinateTransformation::translation(
                        kept.iter().map(|&a| full_translation[a]).collect(),
                    ));
                }
                list
            })
            .collect()
    }
}

/// Split a well name such as `E07` into its row letters and column digits.
pub fn split_well_name(name: &str) -> Result<(&str, &str)> {
    let split = name.find(|c: char| c.is_ascii_digit()).unwrap_or(name.len());
    let (row, col) = name.split_at(split);
    let valid = !row.is_empty()
        && row.chars().all(|c| c.is_ascii_uppercase())
        && !col.is_empty()
        && col.chars().all(|c| c.is_ascii_digit());
    if !valid {
        return Err(HcsError::config(format!(
            "'{name}' is not a well name like 'E07'"
        )));
    }
    Ok((row, col))
}
