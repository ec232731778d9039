//! Deferred, chunked array computation.
//!
//! A [`LazyArray`] is a shape, a chunk grid and a [`ChunkSource`] node that
//! knows how to compute any region of the array on demand. Stages such as
//! stitching, binning and pyramid downsampling wrap their input node in a new
//! node; nothing is computed until a persist task asks for a region.

mod coarsen;
mod region;
mod squeeze;
mod stored;

use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};

use crate::element::{DataType, Element};
use crate::error::{HcsError, Result};

pub use coarsen::coarsen_block_mean;
pub use region::Region;
pub use stored::stored_array;

/// Description of one node of a lazy computation graph and its inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeInfo {
    pub label: String,
    pub inputs: Vec<NodeInfo>,
}

impl NodeInfo {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_inputs(label: impl Into<String>, inputs: Vec<NodeInfo>) -> Self {
        Self {
            label: label.into(),
            inputs,
        }
    }

    /// Length of the longest path from this node to a leaf (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.inputs.iter().map(NodeInfo::depth).max().unwrap_or(0)
    }

    /// Total number of nodes in the graph rooted here.
    pub fn node_count(&self) -> usize {
        1 + self.inputs.iter().map(NodeInfo::node_count).sum::<usize>()
    }
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)?;
        match self.inputs.len() {
            0 => Ok(()),
            1 => write!(f, " <- {}", self.inputs[0]),
            n => write!(f, " <- [{n} inputs]"),
        }
    }
}

/// A node that computes arbitrary regions of a lazy array.
///
/// Implementations must be pure with respect to the region: computing the
/// same region twice yields the same values. They are shared between worker
/// threads, so all state must be read-only.
pub trait ChunkSource<T: Element>: Send + Sync {
    fn shape(&self) -> &[usize];

    /// Compute the values of `region` (guaranteed to lie inside `shape`).
    fn compute(&self, region: &Region) -> Result<ArrayD<T>>;

    fn node(&self) -> NodeInfo;
}

/// A chunked array whose values are computed on demand.
pub struct LazyArray<T: Element> {
    source: Arc<dyn ChunkSource<T>>,
    chunks: Vec<usize>,
}

impl<T: Element> Clone for LazyArray<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            chunks: self.chunks.clone(),
        }
    }
}

impl<T: Element> std::fmt::Debug for LazyArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyArray")
            .field("shape", &self.shape())
            .field("chunks", &self.chunks)
            .field("dtype", &T::DTYPE)
            .field("graph", &self.source.node().label)
            .finish()
    }
}

impl<T: Element> LazyArray<T> {
    pub fn new(source: Arc<dyn ChunkSource<T>>, chunks: &[usize]) -> Result<Self> {
        let chunks = validate_chunks(source.shape(), chunks)?;
        Ok(Self { source, chunks })
    }

    /// Wrap an in-memory array.
    pub fn from_array(data: ArrayD<T>, chunks: &[usize]) -> Result<Self> {
        Self::new(Arc::new(MemorySource::new(data)), chunks)
    }

    /// An array of zeros that never allocates more than one chunk at a time.
    pub fn zeros(shape: &[usize], chunks: &[usize]) -> Result<Self> {
        Self::new(Arc::new(ZerosSource::new(shape.to_vec())), chunks)
    }

    pub fn shape(&self) -> &[usize] {
        self.source.shape()
    }

    pub fn chunks(&self) -> &[usize] {
        &self.chunks
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn dtype(&self) -> DataType {
        T::DTYPE
    }

    pub fn graph(&self) -> NodeInfo {
        self.source.node()
    }

    /// Same values, different chunk grid.
    pub fn rechunk(&self, chunks: &[usize]) -> Result<Self> {
        Self::new(Arc::clone(&self.source), chunks)
    }

    /// Regions of the chunk grid, row-major, clipped at the array edges.
    pub fn chunk_regions(&self) -> Vec<Region> {
        Region::grid(self.shape(), &self.chunks)
    }

    pub fn compute_region(&self, region: &Region) -> Result<ArrayD<T>> {
        if !region.fits_in(self.shape()) {
            return Err(HcsError::config(format!(
                "region {region} lies outside array of shape {:?}",
                self.shape()
            )));
        }
        let data = self.source.compute(region)?;
        debug_assert_eq!(data.shape(), region.shape.as_slice());
        Ok(data)
    }

    /// Materialize the whole array. Only sensible for small arrays.
    pub fn compute(&self) -> Result<ArrayD<T>> {
        self.compute_region(&Region::full(self.shape()))
    }

    /// Block-mean downsample the trailing two axes by `factor`, casting back
    /// to `T` and discarding incomplete trailing blocks.
    pub fn coarsen_yx(&self, factor: usize) -> Result<Self> {
        coarsen::coarsen_yx(self, factor)
    }

    /// Drop leading singleton axes (the trailing two axes are always kept).
    ///
    /// Returns the squeezed array and the indices of the kept axes.
    pub fn squeeze_leading(&self) -> Result<(Self, Vec<usize>)> {
        squeeze::squeeze_leading(self)
    }
}

fn validate_chunks(shape: &[usize], chunks: &[usize]) -> Result<Vec<usize>> {
    if chunks.len() != shape.len() {
        return Err(HcsError::config(format!(
            "chunk shape {chunks:?} does not match array rank {} (shape {shape:?})",
            shape.len()
        )));
    }
    if chunks.iter().any(|&c| c == 0) {
        return Err(HcsError::config(format!(
            "chunk shape {chunks:?} contains a zero-sized axis"
        )));
    }
    Ok(chunks.to_vec())
}

struct MemorySource<T: Element> {
    data: ArrayD<T>,
    shape: Vec<usize>,
}

impl<T: Element> MemorySource<T> {
    fn new(data: ArrayD<T>) -> Self {
        let shape = data.shape().to_vec();
        Self { data, shape }
    }
}

impl<T: Element> ChunkSource<T> for MemorySource<T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn compute(&self, region: &Region) -> Result<ArrayD<T>> {
        Ok(region.view(&self.data).to_owned())
    }

    fn node(&self) -> NodeInfo {
        NodeInfo::leaf(format!("array{:?}", self.shape))
    }
}

struct ZerosSource {
    shape: Vec<usize>,
}

impl ZerosSource {
    fn new(shape: Vec<usize>) -> Self {
        Self { shape }
    }
}

impl<T: Element> ChunkSource<T> for ZerosSource {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn compute(&self, region: &Region) -> Result<ArrayD<T>> {
        Ok(ArrayD::zeros(IxDyn(&region.shape)))
    }

    fn node(&self) -> NodeInfo {
        NodeInfo::leaf(format!("zeros{:?}", self.shape))
    }
}
