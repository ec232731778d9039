use std::sync::Arc;

use ndarray::ArrayD;

use crate::element::Element;
use crate::error::Result;
use crate::store::ZarrArray;

use super::{ChunkSource, LazyArray, NodeInfo, Region};

/// Leaf node reading regions from a persisted array.
struct StoredSource<T: Element> {
    array: ZarrArray<T>,
}

impl<T: Element> ChunkSource<T> for StoredSource<T> {
    fn shape(&self) -> &[usize] {
        self.array.shape()
    }

    fn compute(&self, region: &Region) -> Result<ArrayD<T>> {
        self.array.read_region(region)
    }

    fn node(&self) -> NodeInfo {
        NodeInfo::leaf(format!("stored({})", self.array.dir().display()))
    }
}

/// Lazily read a persisted array back, chunked like its storage.
///
/// The returned graph is a single leaf regardless of how the array was
/// produced, which keeps pyramid graphs from growing level over level.
pub fn stored_array<T: Element>(array: &ZarrArray<T>) -> Result<LazyArray<T>> {
    let chunks = array.chunks().to_vec();
    LazyArray::new(
        Arc::new(StoredSource {
            array: array.clone(),
        }),
        &chunks,
    )
}
