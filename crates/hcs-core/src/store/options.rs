use serde::{Deserialize, Serialize};

use super::codec::Compressor;

/// Separator between chunk indices in chunk keys (`0/1/2` or `0.1.2`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionSeparator {
    #[default]
    #[serde(rename = "/")]
    Slash,
    #[serde(rename = ".")]
    Dot,
}

impl DimensionSeparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slash => "/",
            Self::Dot => ".",
        }
    }

    /// Separator of a `.zarray` without a `dimension_separator` key.
    pub fn zarr_v2_default() -> Self {
        Self::Dot
    }
}

/// How a level array is laid out and encoded on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageOptions {
    /// Storage chunk shape. `None` falls back to the run's padded chunk shape.
    #[serde(default)]
    pub chunks: Option<Vec<usize>>,
    /// `None` stores chunks uncompressed.
    #[serde(default)]
    pub compressor: Option<Compressor>,
    #[serde(default)]
    pub dimension_separator: DimensionSeparator,
    /// Write chunks whose elements all equal the fill value.
    #[serde(default)]
    pub write_empty_chunks: bool,
}

impl StorageOptions {
    /// Default options for an array of `shape` written with the requested
    /// `chunks`: Blosc zstd with byte shuffle, `/` keys, sparse empty chunks.
    pub fn default_for(shape: &[usize], chunks: &[usize]) -> Self {
        Self {
            chunks: Some(out_chunks(shape, chunks)),
            compressor: Some(Compressor::default()),
            dimension_separator: DimensionSeparator::Slash,
            write_empty_chunks: false,
        }
    }

    /// Chunk shape these options produce for an array of `shape`.
    pub fn chunks_for(&self, shape: &[usize], requested: &[usize]) -> Vec<usize> {
        match &self.chunks {
            Some(chunks) => chunks.clone(),
            None => out_chunks(shape, requested),
        }
    }
}

/// Options for one level: custom options verbatim if given, else the default.
pub fn resolve_storage_options(
    custom: Option<&StorageOptions>,
    shape: &[usize],
    chunks: &[usize],
) -> StorageOptions {
    match custom {
        Some(options) => options.clone(),
        None => StorageOptions::default_for(shape, chunks),
    }
}

/// Match a requested chunk shape to the rank of `shape`.
///
/// Extra leading axes get singleton chunks; a chunk shape with more axes than
/// the array keeps its trailing entries.
pub fn out_chunks(shape: &[usize], chunks: &[usize]) -> Vec<usize> {
    if shape.len() >= chunks.len() {
        let mut out = vec![1; shape.len() - chunks.len()];
        out.extend_from_slice(chunks);
        out
    } else {
        chunks[chunks.len() - shape.len()..].to_vec()
    }
}
