//! TOML description of an acquisition that has already been parsed into
//! tiles: which files make up each tile, where it sits, how it is corrected.
//!
//! ```toml
//! layout = "96"
//! order_name = "order-1"
//! barcode = "BC-0001"
//! dtype = "uint16"
//! well_shape = [1, 1, 1, 4096, 4096]
//! pixel_spacing = { z = 1.0, y = 0.65, x = 0.65 }
//!
//! [channels.w1]
//! channel_index = 0
//! channel_name = "DAPI"
//! display_color = "0000FF"
//! spatial_calibration_x = 0.65
//! spatial_calibration_y = 0.65
//! spatial_calibration_units = "um"
//!
//! [[wells]]
//! name = "E07"
//!
//! [[wells.tiles]]
//! planes = ["E07_z0.tif", ""]
//! shape = [2, 2048, 2048]
//! position = { time = 0, channel = 0, z = 0, y = 0, x = 0 }
//! background = "dark.tif"
//! ```
//!
//! Relative paths are resolved against the manifest's directory. An empty
//! plane entry marks a plane that was not acquired.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::WELL_NDIM;
use crate::element::{DataType, Element};
use crate::error::{HcsError, Result};
use crate::ngff::PlateLayout;

use super::plate::{ChannelMetadata, PlateAcquisition};
use super::tile::{CorrectionMatrix, Tile, TilePosition};
use super::well::{PixelSpacing, WellAcquisition};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileEntry {
    pub planes: Vec<String>,
    pub shape: Vec<usize>,
    #[serde(default)]
    pub position: TilePosition,
    #[serde(default)]
    pub background: Option<PathBuf>,
    #[serde(default)]
    pub illumination: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WellEntry {
    pub name: String,
    /// Stage position (z, y, x) of the well origin in micrometer.
    #[serde(default)]
    pub origin: Option<[f64; 3]>,
    #[serde(default)]
    pub tiles: Vec<TileEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquisitionManifest {
    #[serde(default)]
    pub layout: PlateLayout,
    #[serde(default)]
    pub order_name: String,
    #[serde(default)]
    pub barcode: String,
    pub dtype: DataType,
    pub well_shape: [usize; WELL_NDIM],
    #[serde(default)]
    pub pixel_spacing: PixelSpacing,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelMetadata>,
    #[serde(default)]
    pub wells: Vec<WellEntry>,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl AcquisitionManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| HcsError::load(path, e))?;
        let mut manifest: Self = toml::from_str(&contents)?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(manifest)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Build the plate acquisition. `T` must match the manifest's `dtype`.
    ///
    /// Correction matrices referenced by several tiles are loaded once and
    /// shared.
    pub fn to_plate<T: Element>(&self) -> Result<PlateAcquisition<T>> {
        if self.dtype != T::DTYPE {
            return Err(HcsError::config(format!(
                "manifest declares dtype {}, requested {}",
                self.dtype,
                T::DTYPE
            )));
        }
        let mut matrices: HashMap<PathBuf, CorrectionMatrix> = HashMap::new();
        let mut load_matrix = |path: &Path| -> Result<CorrectionMatrix> {
            let path = self.resolve(path);
            if let Some(matrix) = matrices.get(&path) {
                return Ok(matrix.clone());
            }
            debug!(path = %path.display(), "Loading correction matrix");
            let matrix = CorrectionMatrix::load(&path)?;
            matrices.insert(path, matrix.clone());
            Ok(matrix)
        };

        let mut wells = Vec::with_capacity(self.wells.len());
        for entry in &self.wells {
            let mut tiles = Vec::with_capacity(entry.tiles.len());
            for tile in &entry.tiles {
                let planes = tile
                    .planes
                    .iter()
                    .map(|p| (!p.is_empty()).then(|| self.resolve(Path::new(p))))
                    .collect();
                let mut t = Tile::new(planes, tile.shape.clone(), tile.position)?;
                if let Some(bg) = &tile.background {
                    t = t.with_background(load_matrix(bg)?);
                }
                if let Some(illum) = &tile.illumination {
                    t = t.with_illumination(load_matrix(illum)?);
                }
                tiles.push(t);
            }
            let mut well = WellAcquisition::new(
                entry.name.clone(),
                tiles,
                self.pixel_spacing,
                self.channels.clone(),
            )?;
            if let Some(origin) = entry.origin {
                well = well.with_origin(origin);
            }
            wells.push(well);
        }

        Ok(PlateAcquisition::new(self.layout, wells, self.well_shape, self.channels.clone())?
            .with_provenance(self.order_name.clone(), self.barcode.clone()))
    }
}
