use ndarray::{s, Array3, ArrayView3};

use crate::acquisition::TilePosition;

/// The (z, y, x) box of the well image one stitching block covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpatialFrame {
    pub start: [usize; 3],
    pub shape: [usize; 3],
}

impl SpatialFrame {
    pub fn end(&self, axis: usize) -> usize {
        self.start[axis] + self.shape[axis]
    }
}

/// One tile resampled into a frame. `weight` is zero where the tile does not
/// cover the frame and positive where it does; its magnitude is the distance
/// (in pixels, at least 1) to the nearest YX border of the tile.
#[derive(Clone, Debug)]
pub struct PlacedTile {
    pub data: Array3<f32>,
    pub weight: Array3<f32>,
}

/// Maps a tile's pixels into a target frame.
pub trait Warp: Send + Sync {
    fn name(&self) -> &str;

    /// Place `tile` (shape `(z, y, x)`) at `position` inside `frame`.
    /// Returns `None` if the tile does not reach into the frame.
    fn warp(&self, tile: ArrayView3<'_, f32>, position: &TilePosition, frame: &SpatialFrame) -> Option<PlacedTile>;
}

/// Integer translation: the tile's first pixel lands on its position.
#[derive(Clone, Copy, Debug, Default)]
pub struct TranslateWarp;

impl Warp for TranslateWarp {
    fn name(&self) -> &str {
        "translate"
    }

    fn warp(&self, tile: ArrayView3<'_, f32>, position: &TilePosition, frame: &SpatialFrame) -> Option<PlacedTile> {
        let origin = [position.z, position.y, position.x];
        let (tz, ty, tx) = tile.dim();
        let extent = [tz, ty, tx];

        let mut lo = [0usize; 3];
        let mut hi = [0usize; 3];
        for a in 0..3 {
            lo[a] = origin[a].max(frame.start[a]);
            hi[a] = (origin[a] + extent[a]).min(frame.end(a));
            if hi[a] <= lo[a] {
                return None;
            }
        }

        let shape = (frame.shape[0], frame.shape[1], frame.shape[2]);
        let mut data = Array3::<f32>::zeros(shape);
        let mut weight = Array3::<f32>::zeros(shape);

        let src = tile.slice(s![
            lo[0] - origin[0]..hi[0] - origin[0],
            lo[1] - origin[1]..hi[1] - origin[1],
            lo[2] - origin[2]..hi[2] - origin[2]
        ]);
        let dst = s![
            lo[0] - frame.start[0]..hi[0] - frame.start[0],
            lo[1] - frame.start[1]..hi[1] - frame.start[1],
            lo[2] - frame.start[2]..hi[2] - frame.start[2]
        ];
        data.slice_mut(dst).assign(&src);

        let y0 = lo[1] - origin[1];
        let x0 = lo[2] - origin[2];
        weight
            .slice_mut(dst)
            .indexed_iter_mut()
            .for_each(|((_, y, x), w)| *w = edge_distance(y0 + y, ty).min(edge_distance(x0 + x, tx)));

        Some(PlacedTile { data, weight })
    }
}

/// 1-based distance of index `i` to the nearer end of `0..n`.
fn edge_distance(i: usize, n: usize) -> f32 {
    (i + 1).min(n - i) as f32
}
