use std::sync::Arc;

use ndarray::{ArrayD, IxDyn};

use crate::element::Element;
use crate::error::{HcsError, Result};

use super::{ChunkSource, LazyArray, NodeInfo, Region};

/// View of an array with some leading singleton axes removed.
struct SqueezeSource<T: Element> {
    input: LazyArray<T>,
    kept: Vec<usize>,
    shape: Vec<usize>,
}

impl<T: Element> ChunkSource<T> for SqueezeSource<T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn compute(&self, region: &Region) -> Result<ArrayD<T>> {
        let full_ndim = self.input.ndim();
        let mut upstream = Region::new(vec![0; full_ndim], vec![1; full_ndim]);
        for (i, &axis) in self.kept.iter().enumerate() {
            upstream.start[axis] = region.start[i];
            upstream.shape[axis] = region.shape[i];
        }
        let data = self.input.compute_region(&upstream)?;
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        data.into_shape_with_order(IxDyn(&region.shape))
            .map_err(|e| HcsError::Codec(format!("squeeze reshape failed: {e}")))
    }

    fn node(&self) -> NodeInfo {
        NodeInfo::with_inputs(format!("squeeze{:?}", self.kept), vec![self.input.graph()])
    }
}

pub(super) fn squeeze_leading<T: Element>(input: &LazyArray<T>) -> Result<(LazyArray<T>, Vec<usize>)> {
    let nd = input.ndim();
    if nd <= 2 {
        return Ok((input.clone(), (0..nd).collect()));
    }

    let kept: Vec<usize> = (0..nd)
        .filter(|&axis| axis >= nd - 2 || input.shape()[axis] != 1)
        .collect();
    if kept.len() == nd {
        return Ok((input.clone(), kept));
    }

    let shape: Vec<usize> = kept.iter().map(|&a| input.shape()[a]).collect();
    let chunks: Vec<usize> = kept.iter().map(|&a| input.chunks()[a]).collect();
    let source = SqueezeSource {
        input: input.clone(),
        kept: kept.clone(),
        shape,
    };
    Ok((LazyArray::new(Arc::new(source), &chunks)?, kept))
}
