use ndarray::{Array3, Zip};

use crate::consts::EPSILON;

use super::warp::PlacedTile;

/// Combines the tiles placed into one frame.
pub trait Fuse: Send + Sync {
    fn name(&self) -> &str;

    /// Fuse `tiles` (all shaped `shape`) into one frame. Pixels no tile
    /// covers must be zero.
    fn fuse(&self, shape: (usize, usize, usize), tiles: &[PlacedTile]) -> Array3<f32>;
}

/// Arithmetic mean of every tile covering a pixel.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeanFuse;

impl Fuse for MeanFuse {
    fn name(&self) -> &str {
        "mean"
    }

    fn fuse(&self, shape: (usize, usize, usize), tiles: &[PlacedTile]) -> Array3<f32> {
        let mut sum = Array3::<f32>::zeros(shape);
        let mut count = Array3::<f32>::zeros(shape);
        for tile in tiles {
            Zip::from(&mut sum)
                .and(&mut count)
                .and(&tile.data)
                .and(&tile.weight)
                .for_each(|s, n, &v, &w| {
                    if w > 0.0 {
                        *s += v;
                        *n += 1.0;
                    }
                });
        }
        Zip::from(&mut sum).and(&count).for_each(|s, &n| {
            if n > 0.0 {
                *s /= n;
            }
        });
        sum
    }
}

/// Sum of every tile covering a pixel; saturates when cast to the output type.
#[derive(Clone, Copy, Debug, Default)]
pub struct SumFuse;

impl Fuse for SumFuse {
    fn name(&self) -> &str {
        "sum"
    }

    fn fuse(&self, shape: (usize, usize, usize), tiles: &[PlacedTile]) -> Array3<f32> {
        let mut sum = Array3::<f32>::zeros(shape);
        for tile in tiles {
            Zip::from(&mut sum)
                .and(&tile.data)
                .and(&tile.weight)
                .for_each(|s, &v, &w| {
                    if w > 0.0 {
                        *s += v;
                    }
                });
        }
        sum
    }
}

/// Weighted mean with weights falling off linearly towards each tile's
/// border, so overlaps blend smoothly instead of showing a seam.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearFuse;

impl Fuse for LinearFuse {
    fn name(&self) -> &str {
        "linear"
    }

    fn fuse(&self, shape: (usize, usize, usize), tiles: &[PlacedTile]) -> Array3<f32> {
        let mut sum = Array3::<f32>::zeros(shape);
        let mut weights = Array3::<f32>::zeros(shape);
        for tile in tiles {
            Zip::from(&mut sum)
                .and(&mut weights)
                .and(&tile.data)
                .and(&tile.weight)
                .for_each(|s, acc, &v, &w| {
                    *s += v * w;
                    *acc += w;
                });
        }
        Zip::from(&mut sum).and(&weights).for_each(|s, &w| {
            if w > EPSILON {
                *s /= w;
            }
        });
        sum
    }
}
