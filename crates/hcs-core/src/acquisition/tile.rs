use std::fs::File;
use std::io::Cursor;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, ImageReader};
use memmap2::Mmap;
use ndarray::{Array2, ArrayD, ArrayView2, Axis, IxDyn, Zip};
use serde::{Deserialize, Serialize};

use crate::element::{plane_from_image, Element};
use crate::error::{HcsError, Result};

/// Where a tile sits in its well: time point and channel index, plus Z/Y/X
/// pixel offsets of its first plane/row/column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePosition {
    pub time: usize,
    pub channel: usize,
    pub z: usize,
    pub y: usize,
    pub x: usize,
}

impl TilePosition {
    pub fn new(time: usize, channel: usize, z: usize, y: usize, x: usize) -> Self {
        Self { time, channel, z, y, x }
    }
}

/// Read-only per-pixel correction matrix (background or illumination),
/// shared between all tiles that use it.
#[derive(Clone, Debug)]
pub struct CorrectionMatrix(Arc<Array2<f32>>);

impl CorrectionMatrix {
    pub fn from_array(data: Array2<f32>) -> Self {
        Self(Arc::new(data))
    }

    /// Load a matrix from an image file, keeping raw intensities.
    pub fn load(path: &Path) -> Result<Self> {
        let img = decode_image(path)?;
        let data = plane_from_image::<f32>(&img).map_err(|e| HcsError::load(path, e))?;
        Ok(Self::from_array(data))
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.0.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    /// True if both handles share the same matrix.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// One acquired tile: a stack of planes (or a single plane) with a known
/// position. Pixel data is read from disk on every [`Tile::load_data`] call.
#[derive(Clone, Debug)]
pub struct Tile<T: Element> {
    planes: Vec<Option<PathBuf>>,
    shape: Vec<usize>,
    position: TilePosition,
    background: Option<CorrectionMatrix>,
    illumination: Option<CorrectionMatrix>,
    _marker: PhantomData<T>,
}

impl<T: Element> Tile<T> {
    /// `planes` holds one entry per plane (`None` for a plane that was not
    /// acquired). `shape` is `(y, x)` or `(planes, y, x)`.
    pub fn new(planes: Vec<Option<PathBuf>>, shape: Vec<usize>, position: TilePosition) -> Result<Self> {
        if shape.len() < 2 {
            return Err(HcsError::config(format!(
                "tile shape {shape:?} needs at least Y and X axes"
            )));
        }
        let expected: usize = shape[..shape.len() - 2].iter().product();
        if planes.len() != expected {
            return Err(HcsError::config(format!(
                "tile of shape {shape:?} needs {expected} plane sources, got {}",
                planes.len()
            )));
        }
        Ok(Self {
            planes,
            shape,
            position,
            background: None,
            illumination: None,
            _marker: PhantomData,
        })
    }

    /// A 2-D tile backed by a single image file.
    pub fn single(path: impl Into<PathBuf>, shape: [usize; 2], position: TilePosition) -> Self {
        Self {
            planes: vec![Some(path.into())],
            shape: shape.to_vec(),
            position,
            background: None,
            illumination: None,
            _marker: PhantomData,
        }
    }

    pub fn with_background(mut self, background: CorrectionMatrix) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_illumination(mut self, illumination: CorrectionMatrix) -> Self {
        self.illumination = Some(illumination);
        self
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn position(&self) -> &TilePosition {
        &self.position
    }

    pub fn planes(&self) -> &[Option<PathBuf>] {
        &self.planes
    }

    pub fn background(&self) -> Option<&CorrectionMatrix> {
        self.background.as_ref()
    }

    pub fn illumination(&self) -> Option<&CorrectionMatrix> {
        self.illumination.as_ref()
    }

    /// Height and width of every plane.
    pub fn yx(&self) -> (usize, usize) {
        let n = self.shape.len();
        (self.shape[n - 2], self.shape[n - 1])
    }

    /// Load all planes, zero-filling absent ones, then subtract the
    /// background and divide by the illumination matrix.
    pub fn load_data(&self) -> Result<ArrayD<T>> {
        let (h, w) = self.yx();
        let mut data = ArrayD::<T>::zeros(IxDyn(&self.shape));
        {
            let mut stack = data
                .view_mut()
                .into_shape_with_order((self.planes.len(), h, w))
                .map_err(|e| HcsError::config(format!("tile shape {:?}: {e}", self.shape)))?;
            for (mut slot, source) in stack.axis_iter_mut(Axis(0)).zip(&self.planes) {
                let Some(path) = source else {
                    continue;
                };
                let plane = self.load_plane(path)?;
                slot.assign(&plane);
            }
        }
        Ok(data)
    }

    fn load_plane(&self, path: &Path) -> Result<Array2<T>> {
        let img = decode_image(path)?;
        let plane = plane_from_image::<T>(&img).map_err(|e| HcsError::load(path, e))?;
        let (h, w) = self.yx();
        if plane.dim() != (h, w) {
            return Err(HcsError::load(
                path,
                format!("plane is {:?}, tile expects ({h}, {w})", plane.dim()),
            ));
        }
        correct(plane, self.background.as_ref(), self.illumination.as_ref())
            .map_err(|reason| HcsError::load(path, reason))
    }
}

/// Decode an image file through a read-only memory map.
fn decode_image(path: &Path) -> Result<DynamicImage> {
    let file = File::open(path).map_err(|e| HcsError::load(path, e))?;
    let mmap = unsafe { Mmap::map(&file).map_err(|e| HcsError::load(path, e))? };
    ImageReader::new(Cursor::new(&mmap[..]))
        .with_guessed_format()
        .map_err(|e| HcsError::load(path, e))?
        .decode()
        .map_err(|e| HcsError::load(path, e))
}

/// `illumination_op(plane - background)`; either step is skipped if unset.
fn correct<T: Element>(
    plane: Array2<T>,
    background: Option<&CorrectionMatrix>,
    illumination: Option<&CorrectionMatrix>,
) -> std::result::Result<Array2<T>, String> {
    if background.is_none() && illumination.is_none() {
        return Ok(plane);
    }
    let mut values = plane.mapv(|v| v.as_f64() as f32);
    if let Some(bg) = background {
        if bg.shape() != values.shape() {
            return Err(format!(
                "background matrix {:?} does not match plane {:?}",
                bg.shape(),
                values.shape()
            ));
        }
        values -= &bg.view();
    }
    if let Some(illum) = illumination {
        if illum.shape() != values.shape() {
            return Err(format!(
                "illumination matrix {:?} does not match plane {:?}",
                illum.shape(),
                values.shape()
            ));
        }
        Zip::from(&mut values)
            .and(&illum.view())
            .for_each(|v, &i| *v /= i);
    }
    Ok(values.mapv(|v| T::from_f64_saturating(f64::from(v))))
}
