#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hcs_core::acquisition::{ChannelMetadata, PixelSpacing, PlateAcquisition, Tile, TilePosition, WellAcquisition};
use hcs_core::ngff::PlateLayout;
use image::{ImageBuffer, Luma};
use ndarray::Array2;

/// Write a 16-bit grayscale PNG.
pub fn write_png_u16(path: &Path, plane: &Array2<u16>) {
    let (h, w) = plane.dim();
    let raw: Vec<u16> = plane.iter().copied().collect();
    let img: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(w as u32, h as u32, raw).expect("buffer matches dimensions");
    img.save(path).expect("write png");
}

/// Write a constant `value` plane of `(h, w)` and return its path.
pub fn constant_png(dir: &Path, name: &str, (h, w): (usize, usize), value: u16) -> PathBuf {
    let path = dir.join(name);
    write_png_u16(&path, &Array2::from_elem((h, w), value));
    path
}

/// Write a constant 8-bit grayscale plane and return its path.
pub fn constant_png_u8(dir: &Path, name: &str, (h, w): (usize, usize), value: u8) -> PathBuf {
    let path = dir.join(name);
    let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(w as u32, h as u32, Luma([value]));
    img.save(&path).expect("write png");
    path
}

/// A plane whose value at (y, x) is `y * w + x`.
pub fn ramp_png(dir: &Path, name: &str, (h, w): (usize, usize)) -> PathBuf {
    let path = dir.join(name);
    let plane = Array2::from_shape_fn((h, w), |(y, x)| (y * w + x) as u16);
    write_png_u16(&path, &plane);
    path
}

pub fn single_tile(path: PathBuf, (h, w): (usize, usize), y: usize, x: usize) -> Tile<u16> {
    Tile::single(path, [h, w], TilePosition::new(0, 0, 0, y, x))
}

pub fn dapi_channel() -> BTreeMap<String, ChannelMetadata> {
    let mut channels = BTreeMap::new();
    channels.insert(
        "w1".to_string(),
        ChannelMetadata {
            channel_index: 0,
            channel_name: "DAPI".into(),
            display_color: "0000FF".into(),
            spatial_calibration_x: 0.65,
            spatial_calibration_y: 0.65,
            spatial_calibration_units: "um".into(),
            ..Default::default()
        },
    );
    channels
}

pub fn well(name: &str, tiles: Vec<Tile<u16>>) -> WellAcquisition<u16> {
    WellAcquisition::new(
        name,
        tiles,
        PixelSpacing {
            z: 1.0,
            y: 0.65,
            x: 0.65,
        },
        dapi_channel(),
    )
    .expect("valid well name")
}

pub fn plate(wells: Vec<WellAcquisition<u16>>, well_shape: [usize; 5]) -> PlateAcquisition<u16> {
    PlateAcquisition::new(PlateLayout::I96, wells, well_shape, dapi_channel())
        .expect("valid plate")
        .with_provenance("order-1", "BC-0001")
}
