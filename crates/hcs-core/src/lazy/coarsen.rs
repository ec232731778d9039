use std::sync::Arc;

use ndarray::{Array3, ArrayD, IxDyn, Zip};

use crate::element::Element;
use crate::error::{HcsError, Result};

use super::{ChunkSource, LazyArray, NodeInfo, Region};

/// Mean over non-overlapping `factor`×`factor` blocks of the trailing two
/// axes, cast back to `T`. Rows/columns that do not complete a block are
/// discarded.
pub fn coarsen_block_mean<T: Element>(input: ArrayD<T>, factor: usize) -> Result<ArrayD<T>> {
    let shape = input.shape().to_vec();
    let nd = shape.len();
    if nd < 2 {
        return Err(HcsError::config(format!(
            "cannot coarsen a {nd}-D array over its trailing two axes"
        )));
    }
    if factor == 0 {
        return Err(HcsError::config("coarsening factor must be >= 1"));
    }

    let (h, w) = (shape[nd - 2], shape[nd - 1]);
    let lead: usize = shape[..nd - 2].iter().product();
    let (out_h, out_w) = (h / factor, w / factor);

    let input = if input.is_standard_layout() {
        input
    } else {
        input.as_standard_layout().into_owned()
    };
    let cube = input
        .into_shape_with_order((lead, h, w))
        .map_err(|e| HcsError::Codec(format!("coarsen reshape failed: {e}")))?;

    let norm = (factor * factor) as f64;
    let mut out = Array3::<T>::zeros((lead, out_h, out_w));
    Zip::indexed(&mut out).par_for_each(|(l, oy, ox), value| {
        let mut sum = 0.0f64;
        for dy in 0..factor {
            for dx in 0..factor {
                sum += cube[[l, oy * factor + dy, ox * factor + dx]].as_f64();
            }
        }
        *value = T::from_f64_saturating(sum / norm);
    });

    let mut out_shape = shape[..nd - 2].to_vec();
    out_shape.push(out_h);
    out_shape.push(out_w);
    out.into_shape_with_order(IxDyn(&out_shape))
        .map_err(|e| HcsError::Codec(format!("coarsen reshape failed: {e}")))
}

struct CoarsenSource<T: Element> {
    input: LazyArray<T>,
    factor: usize,
    shape: Vec<usize>,
}

impl<T: Element> ChunkSource<T> for CoarsenSource<T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn compute(&self, region: &Region) -> Result<ArrayD<T>> {
        let nd = region.ndim();
        let mut upstream = region.clone();
        for axis in nd - 2..nd {
            upstream.start[axis] *= self.factor;
            upstream.shape[axis] *= self.factor;
        }
        let data = self.input.compute_region(&upstream)?;
        coarsen_block_mean(data, self.factor)
    }

    fn node(&self) -> NodeInfo {
        NodeInfo::with_inputs(
            format!("coarsen(yx/{})", self.factor),
            vec![self.input.graph()],
        )
    }
}

pub(super) fn coarsen_yx<T: Element>(input: &LazyArray<T>, factor: usize) -> Result<LazyArray<T>> {
    if factor == 0 {
        return Err(HcsError::config("coarsening factor must be >= 1"));
    }
    let nd = input.ndim();
    if nd < 2 {
        return Err(HcsError::config(format!(
            "cannot coarsen a {nd}-D array over its trailing two axes"
        )));
    }

    let mut shape = input.shape().to_vec();
    let mut chunks = input.chunks().to_vec();
    for axis in nd - 2..nd {
        shape[axis] /= factor;
        chunks[axis] = (chunks[axis] / factor).max(1);
    }

    let source = CoarsenSource {
        input: input.clone(),
        factor,
        shape,
    };
    LazyArray::new(Arc::new(source), &chunks)
}
