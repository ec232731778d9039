use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD, IxDyn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use zarrs::array::codec::CodecOptions;
use zarrs::array::{Array, ArrayMetadata as ZarrArrayMetadata};
use zarrs::array_subset::ArraySubset;
use zarrs::filesystem::FilesystemStore;

use crate::consts::ZARR_FORMAT;
use crate::element::{DataType, Element};
use crate::error::{HcsError, Result};
use crate::lazy::Region;

use super::options::{DimensionSeparator, StorageOptions};

pub(crate) const ZARRAY: &str = ".zarray";

/// Summary of a Zarr v2 array's metadata, as stored in `.zarray`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrayMetadata {
    pub zarr_format: u32,
    pub shape: Vec<usize>,
    pub chunks: Vec<usize>,
    pub dtype: String,
    /// Raw numcodecs entry; arrays written elsewhere may use any codec.
    pub compressor: Option<Value>,
    pub fill_value: Value,
    pub order: String,
    #[serde(default)]
    pub filters: Option<Vec<Value>>,
    #[serde(default = "DimensionSeparator::zarr_v2_default")]
    pub dimension_separator: DimensionSeparator,
}

impl ArrayMetadata {
    pub(crate) fn of(array: &Array<FilesystemStore>) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::to_value(array.metadata())?)?)
    }
}

fn to_u64(values: &[usize]) -> Vec<u64> {
    values.iter().map(|&v| v as u64).collect()
}

/// A chunked, compressed n-dimensional array in a Zarr v2 directory.
#[derive(Clone)]
pub struct ZarrArray<T: Element> {
    dir: PathBuf,
    inner: Arc<Array<FilesystemStore>>,
    meta: ArrayMetadata,
    codec_options: CodecOptions,
    _marker: PhantomData<T>,
}

impl<T: Element> std::fmt::Debug for ZarrArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZarrArray")
            .field("dir", &self.dir)
            .field("meta", &self.meta)
            .finish()
    }
}

impl<T: Element> ZarrArray<T> {
    /// Create (or replace) the array at node `node` of `store`, which lives
    /// in directory `dir`.
    pub(crate) fn create(
        store: &Arc<FilesystemStore>,
        node: &str,
        dir: &Path,
        shape: &[usize],
        requested_chunks: &[usize],
        options: &StorageOptions,
    ) -> Result<Self> {
        let chunks = options.chunks_for(shape, requested_chunks);
        if chunks.len() != shape.len() || chunks.iter().any(|&c| c == 0) {
            return Err(HcsError::config(format!(
                "storage chunk shape {chunks:?} is not valid for an array of shape {shape:?}"
            )));
        }
        let metadata: ZarrArrayMetadata = serde_json::from_value(json!({
            "zarr_format": ZARR_FORMAT,
            "shape": shape,
            "chunks": chunks,
            "dtype": T::DTYPE.zarr_dtype(),
            "compressor": options.compressor,
            "fill_value": 0,
            "order": "C",
            "filters": null,
            "dimension_separator": options.dimension_separator,
        }))?;

        if dir.exists() {
            debug!(path = %dir.display(), "Replacing existing array");
            fs::remove_dir_all(dir)?;
        }
        let array = Array::new_with_metadata(Arc::clone(store), node, metadata).map_err(HcsError::zarr)?;
        array.store_metadata().map_err(HcsError::zarr)?;
        Self::from_parts(dir, array, options.write_empty_chunks)
    }

    /// Open an existing array; its dtype must match `T`.
    pub(crate) fn open(store: &Arc<FilesystemStore>, node: &str, dir: &Path) -> Result<Self> {
        if !dir.join(ZARRAY).exists() {
            return Err(HcsError::InvalidStore {
                path: dir.to_path_buf(),
                reason: "missing .zarray".into(),
            });
        }
        let array = Array::open(Arc::clone(store), node).map_err(HcsError::zarr)?;
        let this = Self::from_parts(dir, array, false)?;
        match DataType::from_zarr_dtype(&this.meta.dtype) {
            Some(dtype) if dtype == T::DTYPE => Ok(this),
            _ => Err(HcsError::config(format!(
                "array at {} has dtype '{}', expected {}",
                dir.display(),
                this.meta.dtype,
                T::DTYPE
            ))),
        }
    }

    fn from_parts(dir: &Path, array: Array<FilesystemStore>, write_empty_chunks: bool) -> Result<Self> {
        let meta = ArrayMetadata::of(&array)?;
        if meta.shape.len() != meta.chunks.len() {
            return Err(HcsError::InvalidStore {
                path: dir.to_path_buf(),
                reason: format!("chunks {:?} do not match shape {:?}", meta.chunks, meta.shape),
            });
        }
        let mut codec_options = CodecOptions::default();
        codec_options.set_store_empty_chunks(write_empty_chunks);
        Ok(Self {
            dir: dir.to_path_buf(),
            inner: Arc::new(array),
            meta,
            codec_options,
            _marker: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn shape(&self) -> &[usize] {
        &self.meta.shape
    }

    pub fn chunks(&self) -> &[usize] {
        &self.meta.chunks
    }

    pub fn metadata(&self) -> &ArrayMetadata {
        &self.meta
    }

    fn subset(region: &Region) -> Result<ArraySubset> {
        ArraySubset::new_with_start_shape(to_u64(&region.start), to_u64(&region.shape)).map_err(HcsError::zarr)
    }

    /// Assemble `region` from the chunks that overlap it. Missing chunks read
    /// as the fill value.
    pub fn read_region(&self, region: &Region) -> Result<ArrayD<T>> {
        if !region.fits_in(self.shape()) {
            return Err(HcsError::config(format!(
                "region {region} lies outside array of shape {:?}",
                self.shape()
            )));
        }
        let values = self
            .inner
            .retrieve_array_subset_elements::<T>(&Self::subset(region)?)
            .map_err(HcsError::zarr)?;
        ArrayD::from_shape_vec(IxDyn(&region.shape), values)
            .map_err(|e| HcsError::Codec(format!("region {region} decoded to the wrong size: {e}")))
    }

    /// Write a chunk-aligned `region`.
    ///
    /// Chunks whose elements all equal the fill value are not stored (and a
    /// stale chunk at their key is erased) unless the array was created with
    /// `write_empty_chunks`.
    pub fn write_region(&self, region: &Region, data: ArrayViewD<'_, T>) -> Result<()> {
        if data.shape() != region.shape.as_slice() {
            return Err(HcsError::config(format!(
                "region {region} expects data of shape {:?}, got {:?}",
                region.shape,
                data.shape()
            )));
        }
        for a in 0..region.ndim() {
            let chunk = self.meta.chunks[a];
            let aligned_end = region.end(a) % chunk == 0 || region.end(a) == self.meta.shape[a];
            if region.start[a] % chunk != 0 || !aligned_end {
                return Err(HcsError::config(format!(
                    "region {region} is not aligned to chunks {:?}",
                    self.meta.chunks
                )));
            }
        }
        let values: Vec<T> = data.iter().copied().collect();
        self.inner
            .store_array_subset_elements_opt::<T>(&Self::subset(region)?, &values, &self.codec_options)
            .map_err(HcsError::zarr)
    }
}
