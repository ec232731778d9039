//! Compose the tiles of one well into a single lazy 5-D image.
//!
//! Each block of the output is computed independently: the tiles of the
//! block's time point and channel that reach into it are loaded, placed by a
//! [`Warp`] and combined by a [`Fuse`]. Everything else stays zero.

mod fuse;
mod warp;

use std::sync::Arc;

use ndarray::{s, Array3, ArrayD, Ix3, IxDyn};
use rayon::prelude::*;
use tracing::debug;

use crate::acquisition::Tile;
use crate::consts::WELL_NDIM;
use crate::element::Element;
use crate::error::{HcsError, Result};
use crate::lazy::{ChunkSource, LazyArray, NodeInfo, Region};

pub use fuse::{Fuse, LinearFuse, MeanFuse, SumFuse};
pub use warp::{PlacedTile, SpatialFrame, TranslateWarp, Warp};

/// Builds the lazy stitched image of one well.
pub struct TileStitcher<T: Element> {
    tiles: Arc<Vec<Tile<T>>>,
    output_shape: [usize; WELL_NDIM],
    chunks: Vec<usize>,
}

impl<T: Element> TileStitcher<T> {
    /// `chunk_shape` is `(y, x)` for 2-D tiles and `(z, y, x)` for 3-D tiles;
    /// it becomes the block shape `(1, 1, [z,] y, x)` of the stitched image.
    pub fn new(tiles: &[Tile<T>], output_shape: [usize; WELL_NDIM], chunk_shape: &[usize]) -> Result<Self> {
        let tile_ndim = tiles.first().map(Tile::ndim).unwrap_or(chunk_shape.len());
        if let Some(tile) = tiles.iter().find(|t| !(2..=3).contains(&t.ndim()) || t.ndim() != tile_ndim) {
            return Err(HcsError::config(format!(
                "tiles must all be 2-D or all be 3-D, found a tile of shape {:?}",
                tile.shape()
            )));
        }
        if !(2..=3).contains(&tile_ndim) {
            return Err(HcsError::config(format!(
                "stitching chunks must have 2 or 3 axes, got {chunk_shape:?}"
            )));
        }
        if chunk_shape.len() != tile_ndim {
            return Err(HcsError::config(format!(
                "chunk shape {chunk_shape:?} does not match {tile_ndim}-D tiles"
            )));
        }

        let mut chunks = vec![1; WELL_NDIM - chunk_shape.len()];
        chunks.extend_from_slice(chunk_shape);
        Ok(Self {
            tiles: Arc::new(tiles.to_vec()),
            output_shape,
            chunks,
        })
    }

    /// Block shape of the stitched image.
    pub fn chunks(&self) -> &[usize] {
        &self.chunks
    }

    pub fn stitch(&self, warp: Arc<dyn Warp>, fuse: Arc<dyn Fuse>) -> Result<LazyArray<T>> {
        let source = StitchedSource {
            tiles: Arc::clone(&self.tiles),
            shape: self.output_shape.to_vec(),
            warp,
            fuse,
        };
        LazyArray::new(Arc::new(source), &self.chunks)
    }
}

struct StitchedSource<T: Element> {
    tiles: Arc<Vec<Tile<T>>>,
    shape: Vec<usize>,
    warp: Arc<dyn Warp>,
    fuse: Arc<dyn Fuse>,
}

impl<T: Element> StitchedSource<T> {
    fn reaches_into(tile: &Tile<T>, frame: &SpatialFrame) -> bool {
        let p = tile.position();
        let (h, w) = tile.yx();
        let depth = if tile.ndim() == 3 { tile.shape()[0] } else { 1 };
        let origin = [p.z, p.y, p.x];
        let extent = [depth, h, w];
        (0..3).all(|a| origin[a] < frame.end(a) && origin[a] + extent[a] > frame.start[a])
    }

    /// Fused frame of one time point and channel, or `None` if no tile
    /// contributes.
    fn fuse_frame(&self, time: usize, channel: usize, frame: &SpatialFrame) -> Result<Option<Array3<f32>>> {
        let candidates: Vec<&Tile<T>> = self
            .tiles
            .iter()
            .filter(|t| t.position().time == time && t.position().channel == channel)
            .filter(|t| Self::reaches_into(t, frame))
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }

        let placed = candidates
            .par_iter()
            .map(|tile| {
                let data = tile.load_data()?;
                let (h, w) = tile.yx();
                let stack = data
                    .mapv(|v| v.as_f64() as f32)
                    .into_shape_with_order((data.len() / (h * w), h, w))
                    .map_err(|e| HcsError::config(format!("tile shape {:?}: {e}", tile.shape())))?;
                Ok(self.warp.warp(stack.view(), tile.position(), frame))
            })
            .collect::<Result<Vec<Option<PlacedTile>>>>()?;
        let placed: Vec<PlacedTile> = placed.into_iter().flatten().collect();
        if placed.is_empty() {
            return Ok(None);
        }

        debug!(time, channel, tiles = placed.len(), "Fusing frame");
        let shape = (frame.shape[0], frame.shape[1], frame.shape[2]);
        Ok(Some(self.fuse.fuse(shape, &placed)))
    }
}

impl<T: Element> ChunkSource<T> for StitchedSource<T> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn compute(&self, region: &Region) -> Result<ArrayD<T>> {
        let mut out = ArrayD::<T>::zeros(IxDyn(&region.shape));
        let frame = SpatialFrame {
            start: [region.start[2], region.start[3], region.start[4]],
            shape: [region.shape[2], region.shape[3], region.shape[4]],
        };
        for dt in 0..region.shape[0] {
            for dc in 0..region.shape[1] {
                let time = region.start[0] + dt;
                let channel = region.start[1] + dc;
                let Some(fused) = self.fuse_frame(time, channel, &frame)? else {
                    continue;
                };
                let mut slot = out
                    .slice_mut(s![dt, dc, .., .., ..])
                    .into_dimensionality::<Ix3>()
                    .map_err(|e| HcsError::config(format!("stitched block {region}: {e}")))?;
                slot.zip_mut_with(&fused, |o, &v| *o = T::from_f64_saturating(f64::from(v)));
            }
        }
        Ok(out)
    }

    fn node(&self) -> NodeInfo {
        let inputs = self
            .tiles
            .iter()
            .map(|tile| {
                let p = tile.position();
                let source = tile
                    .planes()
                    .iter()
                    .flatten()
                    .next()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "empty".to_string());
                NodeInfo::leaf(format!(
                    "tile({source}) @ t={} c={} z={} y={} x={}",
                    p.time, p.channel, p.z, p.y, p.x
                ))
            })
            .collect();
        NodeInfo::with_inputs(
            format!("stitch({}, {})", self.warp.name(), self.fuse.name()),
            inputs,
        )
    }
}
