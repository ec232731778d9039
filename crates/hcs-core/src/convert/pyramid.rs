use tracing::info;

use crate::consts::PYRAMID_FACTOR;
use crate::element::Element;
use crate::error::Result;
use crate::executor::Executor;
use crate::lazy::{stored_array, LazyArray};
use crate::store::{persist, resolve_storage_options, Group, StorageOptions};

use super::types::PyramidLevel;

/// Persist `image` as array `path` of `group` with the storage chunk policy
/// for its shape. Blocks of `block_factor` storage chunks along Y and X are
/// computed per task. Returns the level descriptor once every chunk is on
/// disk.
pub(super) fn write_level<T: Element>(
    group: &Group,
    path: &str,
    image: &LazyArray<T>,
    chunks: &[usize],
    storage_options: Option<&StorageOptions>,
    block_factor: usize,
    executor: &dyn Executor,
) -> Result<PyramidLevel> {
    let shape = image.shape().to_vec();
    let options = resolve_storage_options(storage_options, &shape, chunks);
    let array = group.create_array::<T>(path, &shape, chunks, &options)?;

    let mut block = array.chunks().to_vec();
    let nd = block.len();
    for axis in nd.saturating_sub(2)..nd {
        block[axis] *= block_factor;
    }
    let image = image.rechunk(&block)?;
    let graph_depth = image.graph().depth();
    persist(&image, array, executor)?;

    Ok(PyramidLevel {
        path: path.to_string(),
        shape,
        graph_depth,
    })
}

/// Derive levels `1..=max_layer` from the persisted `base` level of `group`
/// and return all levels, `base` first.
///
/// Every level is read back from storage before it is downsampled, so each
/// level's graph is only `stored -> coarsen` no matter how deep the pyramid.
pub fn build_pyramid<T: Element>(
    group: &Group,
    base: PyramidLevel,
    chunks: &[usize],
    max_layer: usize,
    storage_options: Option<&StorageOptions>,
    executor: &dyn Executor,
) -> Result<Vec<PyramidLevel>> {
    let mut image = stored_array(&group.open_array::<T>(&base.path)?)?;
    let mut levels = vec![base];

    for level in 1..=max_layer {
        let path = level.to_string();
        let coarse = image.coarsen_yx(PYRAMID_FACTOR)?;
        let written = write_level(group, &path, &coarse, chunks, storage_options, 1, executor)?;
        info!(
            group = group.path(),
            level,
            shape = ?written.shape,
            "Pyramid level written"
        );
        levels.push(written);
        image = stored_array(&group.open_array::<T>(&path)?)?;
    }
    Ok(levels)
}
