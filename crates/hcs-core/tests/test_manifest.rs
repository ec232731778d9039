mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::constant_png;
use hcs_core::acquisition::AcquisitionManifest;
use hcs_core::convert::{ConversionConfig, ConvertToNgffPlate};
use hcs_core::element::DataType;
use hcs_core::error::HcsError;
use hcs_core::executor::ExecutorPreference;
use hcs_core::lazy::Region;
use hcs_core::ngff::PlateLayout;

const MANIFEST: &str = r#"
layout = "96"
order_name = "order-1"
barcode = "BC-0001"
dtype = "uint16"
well_shape = [1, 1, 1, 4, 8]
pixel_spacing = { z = 2.0, y = 0.5, x = 0.5 }

[channels.w1]
channel_index = 0
channel_name = "DAPI"
display_color = "0000FF"
spatial_calibration_x = 0.5
spatial_calibration_y = 0.5
spatial_calibration_units = "um"

[[wells]]
name = "D04"
origin = [0.0, 10.0, 20.0]

[[wells.tiles]]
planes = ["left.png"]
shape = [4, 4]
position = { time = 0, channel = 0, z = 0, y = 0, x = 0 }
background = "dark.png"

[[wells.tiles]]
planes = ["right.png"]
shape = [4, 4]
position = { time = 0, channel = 0, z = 0, y = 0, x = 4 }
background = "dark.png"

[[wells]]
name = "D05"
"#;

fn write_acquisition(dir: &Path) -> PathBuf {
    constant_png(dir, "left.png", (4, 4), 1100);
    constant_png(dir, "right.png", (4, 4), 2100);
    constant_png(dir, "dark.png", (4, 4), 100);
    let path = dir.join("manifest.toml");
    fs::write(&path, MANIFEST).unwrap();
    path
}

#[test]
fn test_load_resolves_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_acquisition(dir.path());
    let manifest = AcquisitionManifest::load(&path).unwrap();
    assert_eq!(manifest.dtype, DataType::Uint16);
    assert_eq!(manifest.layout, PlateLayout::I96);
    assert_eq!(manifest.wells.len(), 2);

    let plate = manifest.to_plate::<u16>().unwrap();
    assert_eq!(plate.barcode(), "BC-0001");
    let wells = plate.well_acquisitions(None).unwrap();
    let tiles = wells[0].tiles();
    assert_eq!(tiles[0].planes()[0].as_deref(), Some(dir.path().join("left.png").as_path()));
    assert!(wells[1].tiles().is_empty());
}

#[test]
fn test_correction_matrix_shared_between_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_acquisition(dir.path());
    let plate = AcquisitionManifest::load(&path).unwrap().to_plate::<u16>().unwrap();
    let wells = plate.well_acquisitions(None).unwrap();
    let tiles = wells[0].tiles();
    let first = tiles[0].background().unwrap();
    let second = tiles[1].background().unwrap();
    assert!(first.ptr_eq(second));
}

#[test]
fn test_missing_manifest_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AcquisitionManifest::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, HcsError::Load { .. }));
}

#[test]
fn test_malformed_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.toml");
    fs::write(&path, "dtype = \"int64\"\nwell_shape = [1, 1, 1, 4, 4]\n").unwrap();
    assert!(matches!(AcquisitionManifest::load(&path), Err(HcsError::Manifest(_))));
}

#[test]
fn test_manifest_to_plate_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_acquisition(dir.path());
    let manifest = AcquisitionManifest::load(&path).unwrap();
    let acquisition = manifest.to_plate::<u16>().unwrap();

    let mut config = ConversionConfig::default();
    config.plate.root_dir = dir.path().join("out");
    config.plate.name = "screen".into();
    config.executor = ExecutorPreference::RayonThreads(2);
    config.run.chunks = vec![2, 2];
    config.run.max_layer = 1;
    config.run.wells = Some(vec!["D04".into()]);

    let converter = ConvertToNgffPlate::from_config(&config).unwrap();
    let group = converter.create_plate(&acquisition, config.run.wells.as_deref()).unwrap();
    let outputs = converter.run(&group, &acquisition, &config.run).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].well, "D04");

    let level0 = group.group("D/04/0").unwrap().open_array::<u16>("0").unwrap();
    let data = level0.read_region(&Region::full(level0.shape())).unwrap();
    // background subtracted
    assert_eq!(data[[0, 0, 0, 0, 0]], 1000);
    assert_eq!(data[[0, 0, 0, 3, 7]], 2000);

    let transformations = &outputs[0].coordinate_transformations[1];
    assert_eq!(transformations[0].values(), &[1.0, 1.0, 2.0, 1.0, 1.0]);
    assert_eq!(transformations[1].values(), &[0.0, 0.0, 0.0, 10.0, 20.0]);
    assert!(!dir.path().join("out/screen.zarr/D/05").exists());
}

#[test]
fn test_converter_from_config_rejects_invalid() {
    let mut config = ConversionConfig::default();
    config.yx_binning = 0;
    assert!(ConvertToNgffPlate::from_config(&config).is_err());
}
