use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_CHUNKS, DEFAULT_MAX_LAYER, DEFAULT_WELL_SUB_GROUP, PLATE_STORE_SUFFIX};
use crate::error::{HcsError, Result};
use crate::executor::ExecutorPreference;
use crate::ngff::PlateLayout;
use crate::stitch::{Fuse, LinearFuse, MeanFuse, SumFuse, TranslateWarp, Warp};
use crate::store::StorageOptions;

/// Where and under which name the plate store is written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NgffPlate {
    pub root_dir: PathBuf,
    pub name: String,
    #[serde(default)]
    pub layout: PlateLayout,
    #[serde(default)]
    pub order_name: String,
    #[serde(default)]
    pub barcode: String,
}

impl NgffPlate {
    /// `<root_dir>/<name>.zarr`
    pub fn store_path(&self) -> PathBuf {
        self.root_dir.join(format!("{}{PLATE_STORE_SUFFIX}", self.name))
    }
}

impl Default for NgffPlate {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            name: "plate".to_string(),
            layout: PlateLayout::default(),
            order_name: String::new(),
            barcode: String::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarpMethod {
    /// Integer translation to the tile position.
    #[default]
    Translate,
}

impl WarpMethod {
    pub fn build(&self) -> Arc<dyn Warp> {
        match self {
            Self::Translate => Arc::new(TranslateWarp),
        }
    }
}

impl std::fmt::Display for WarpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Translate => write!(f, "Translate"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuseMethod {
    #[default]
    Mean,
    Sum,
    /// Distance-weighted blend across overlaps.
    Linear,
}

impl FuseMethod {
    pub fn build(&self) -> Arc<dyn Fuse> {
        match self {
            Self::Mean => Arc::new(MeanFuse),
            Self::Sum => Arc::new(SumFuse),
            Self::Linear => Arc::new(LinearFuse),
        }
    }
}

impl std::fmt::Display for FuseMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mean => write!(f, "Mean"),
            Self::Sum => write!(f, "Sum"),
            Self::Linear => write!(f, "Linear"),
        }
    }
}

/// Options of one conversion run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Wells to convert, e.g. `["E07"]`. `None` converts all wells.
    #[serde(default)]
    pub wells: Option<Vec<String>>,
    #[serde(default = "default_well_sub_group")]
    pub well_sub_group: String,
    /// Chunk shape in (Z)YX; must match the tile dimensionality.
    #[serde(default = "default_chunks")]
    pub chunks: Vec<usize>,
    #[serde(default = "default_max_layer")]
    pub max_layer: usize,
    /// Overrides the default storage options for every level.
    #[serde(default)]
    pub storage_options: Option<StorageOptions>,
    /// Drop leading singleton axes before writing.
    #[serde(default)]
    pub squeeze_singleton_axes: bool,
}

fn default_well_sub_group() -> String {
    DEFAULT_WELL_SUB_GROUP.to_string()
}

fn default_chunks() -> Vec<usize> {
    DEFAULT_CHUNKS.to_vec()
}

fn default_max_layer() -> usize {
    DEFAULT_MAX_LAYER
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            wells: None,
            well_sub_group: default_well_sub_group(),
            chunks: default_chunks(),
            max_layer: default_max_layer(),
            storage_options: None,
            squeeze_singleton_axes: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if !(2..=3).contains(&self.chunks.len()) {
            return Err(HcsError::config(format!(
                "chunks must be 2D or 3D, got {:?}",
                self.chunks
            )));
        }
        if self.chunks.iter().any(|&c| c == 0) {
            return Err(HcsError::config(format!(
                "chunks {:?} contain a zero-sized axis",
                self.chunks
            )));
        }
        if self.well_sub_group.is_empty() || self.well_sub_group.contains('/') {
            return Err(HcsError::config(format!(
                "'{}' is not a valid well subgroup name",
                self.well_sub_group
            )));
        }
        Ok(())
    }
}

fn default_one() -> usize {
    1
}

/// Everything needed to convert a plate acquisition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversionConfig {
    pub plate: NgffPlate,
    #[serde(default = "default_one")]
    pub yx_binning: usize,
    #[serde(default = "default_one")]
    pub stitching_yx_chunk_size_factor: usize,
    #[serde(default)]
    pub warp: WarpMethod,
    #[serde(default)]
    pub fuse: FuseMethod,
    #[serde(default)]
    pub executor: ExecutorPreference,
    #[serde(default)]
    pub run: RunConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            plate: NgffPlate::default(),
            yx_binning: 1,
            stitching_yx_chunk_size_factor: 1,
            warp: WarpMethod::default(),
            fuse: FuseMethod::default(),
            executor: ExecutorPreference::default(),
            run: RunConfig::default(),
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.yx_binning < 1 {
            return Err(HcsError::config("yx_binning must be an integer >= 1"));
        }
        if self.stitching_yx_chunk_size_factor < 1 {
            return Err(HcsError::config(
                "stitching_yx_chunk_size_factor must be an integer >= 1",
            ));
        }
        if self.plate.name.is_empty() {
            return Err(HcsError::config("plate name must not be empty"));
        }
        self.run.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_path() {
        let plate = NgffPlate {
            root_dir: PathBuf::from("/out"),
            name: "screen".into(),
            ..Default::default()
        };
        assert_eq!(plate.store_path(), PathBuf::from("/out/screen.zarr"));
    }

    #[test]
    fn test_fuse_method_builds_named_strategy() {
        assert_eq!(FuseMethod::Linear.build().name(), "linear");
        assert_eq!(WarpMethod::Translate.build().name(), "translate");
    }

    #[test]
    fn test_run_validation() {
        let mut run = RunConfig::default();
        run.validate().unwrap();
        run.chunks = vec![512];
        assert!(run.validate().unwrap_err().is_configuration());
        run.chunks = vec![1, 1, 512, 512];
        assert!(run.validate().is_err());
    }
}
