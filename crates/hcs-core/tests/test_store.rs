use hcs_core::executor::InlineExecutor;
use hcs_core::lazy::{stored_array, LazyArray, Region};
use hcs_core::store::codec::{BloscCname, Compressor, BLOSC_SHUFFLE};
use hcs_core::store::{persist, DimensionSeparator, Group, StorageOptions};
use ndarray::{ArrayD, IxDyn};
use serde_json::json;

fn ramp(shape: &[usize]) -> ArrayD<u16> {
    let n: usize = shape.iter().product();
    ArrayD::from_shape_vec(IxDyn(shape), (0..n).map(|v| v as u16).collect()).unwrap()
}

// ---------------------------------------------------------------------------
// Groups and attributes
// ---------------------------------------------------------------------------

#[test]
fn test_group_layout_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(&dir.path().join("plate.zarr")).unwrap();
    let well = root.require_group("E").unwrap().require_group("07").unwrap();

    assert_eq!(well.path(), "E/07");
    assert!(dir.path().join("plate.zarr/.zgroup").exists());
    assert!(dir.path().join("plate.zarr/E/07/.zgroup").exists());
    assert!(root.group("E/07").is_ok());
    assert!(root.group("F").is_err());
}

#[test]
fn test_set_attr_keeps_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    root.set_attr("a", 1).unwrap();
    root.set_attr("b", "two").unwrap();
    assert_eq!(root.attr("a").unwrap(), Some(json!(1)));
    assert_eq!(root.attr("b").unwrap(), Some(json!("two")));

    root.put_attrs(serde_json::Map::new()).unwrap();
    assert!(root.attrs().unwrap().is_empty());
}

#[test]
fn test_open_requires_zgroup() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Group::open(dir.path()).is_err());
}

#[test]
fn test_create_keeps_existing_group_attrs() {
    let dir = tempfile::tempdir().unwrap();
    Group::create(dir.path()).unwrap().set_attr("a", 1).unwrap();
    let again = Group::create(dir.path()).unwrap();
    assert_eq!(again.attr("a").unwrap(), Some(json!(1)));
}

// ---------------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------------

fn read_zarray(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path.join(".zarray")).unwrap()).unwrap()
}

#[test]
fn test_default_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let shape = [1, 1, 1, 10, 10];
    let options = StorageOptions::default_for(&shape, &[4, 4]);
    assert_eq!(
        options.compressor,
        Some(Compressor::Blosc {
            cname: BloscCname::Zstd,
            clevel: 3,
            shuffle: BLOSC_SHUFFLE,
            blocksize: 0,
        })
    );
    root.create_array::<u16>("0", &shape, &[4, 4], &options).unwrap();

    let meta = root.array_metadata("0").unwrap();
    assert_eq!(meta.zarr_format, 2);
    assert_eq!(meta.chunks, vec![1, 1, 1, 4, 4]);
    assert_eq!(meta.dtype, "<u2");
    assert_eq!(meta.dimension_separator, DimensionSeparator::Slash);

    let zarray = read_zarray(&dir.path().join("0"));
    assert_eq!(zarray["compressor"]["id"], "blosc");
    assert_eq!(zarray["compressor"]["cname"], "zstd");
    assert_eq!(zarray["compressor"]["clevel"], 3);
    assert_eq!(zarray["compressor"]["shuffle"], 1);
    assert_eq!(zarray["dimension_separator"], "/");
}

#[test]
fn test_region_round_trip_with_partial_edge_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let shape = [10, 7];
    let options = StorageOptions::default_for(&shape, &[4, 4]);
    let array = root.create_array::<u16>("img", &shape, &[4, 4], &options).unwrap();

    let data = ramp(&shape);
    array.write_region(&Region::full(&shape), data.view()).unwrap();
    // 3 x 2 chunks, none of them empty
    assert!(dir.path().join("img/0/0").exists());
    assert!(dir.path().join("img/2/1").exists());

    let reopened = root.open_array::<u16>("img").unwrap();
    assert_eq!(reopened.read_region(&Region::full(&shape)).unwrap(), data);

    let inner = Region::new(vec![3, 2], vec![5, 4]);
    let part = reopened.read_region(&inner).unwrap();
    assert_eq!(part[[0, 0]], 3 * 7 + 2);
    assert_eq!(part[[4, 3]], 7 * 7 + 5);
}

#[test]
fn test_empty_chunks_are_not_stored() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let shape = [4, 8];
    let options = StorageOptions::default_for(&shape, &[4, 4]);
    let array = root.create_array::<u16>("img", &shape, &[4, 4], &options).unwrap();

    let mut data = ArrayD::<u16>::zeros(IxDyn(&shape));
    data[[0, 5]] = 1;
    array.write_region(&Region::full(&shape), data.view()).unwrap();
    assert!(!dir.path().join("img/0/0").exists());
    assert!(dir.path().join("img/0/1").exists());

    // overwriting with zeros removes the stale chunk
    let zeros = ArrayD::<u16>::zeros(IxDyn(&shape));
    array.write_region(&Region::full(&shape), zeros.view()).unwrap();
    assert!(!dir.path().join("img/0/1").exists());
    assert!(array.read_region(&Region::full(&shape)).unwrap().iter().all(|&v| v == 0));
}

#[test]
fn test_write_empty_chunks_and_dot_separator() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let options = StorageOptions {
        chunks: Some(vec![2, 2]),
        compressor: None,
        dimension_separator: DimensionSeparator::Dot,
        write_empty_chunks: true,
    };
    let array = root.create_array::<u8>("img", &[2, 4], &[2, 2], &options).unwrap();
    let zeros = ArrayD::<u8>::zeros(IxDyn(&[2, 4]));
    array.write_region(&Region::full(&[2, 4]), zeros.view()).unwrap();
    assert!(dir.path().join("img/0.0").exists());
    assert!(dir.path().join("img/0.1").exists());

    let meta = root.array_metadata("img").unwrap();
    assert_eq!(meta.compressor, None);
    assert_eq!(meta.dimension_separator, DimensionSeparator::Dot);
}

#[test]
fn test_zstd_compressor_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let options = StorageOptions {
        compressor: Some(Compressor::Zstd { level: 5 }),
        ..StorageOptions::default_for(&[6, 6], &[4, 4])
    };
    let array = root.create_array::<f32>("img", &[6, 6], &[4, 4], &options).unwrap();
    let data = ramp(&[6, 6]).mapv(|v| v as f32 * 0.5);
    array.write_region(&Region::full(&[6, 6]), data.view()).unwrap();
    assert_eq!(root.open_array::<f32>("img").unwrap().read_region(&Region::full(&[6, 6])).unwrap(), data);
    assert_eq!(read_zarray(&dir.path().join("img"))["compressor"]["id"], "zstd");
}

#[test]
fn test_reads_array_without_dimension_separator() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let array_dir = dir.path().join("legacy");
    std::fs::create_dir_all(&array_dir).unwrap();
    let zarray = json!({
        "zarr_format": 2,
        "shape": [2, 4],
        "chunks": [2, 2],
        "dtype": "<u2",
        "compressor": null,
        "fill_value": 0,
        "order": "C",
        "filters": null,
    });
    std::fs::write(array_dir.join(".zarray"), serde_json::to_vec(&zarray).unwrap()).unwrap();
    // uncompressed little-endian chunk (0, 1) holding [[1, 2], [3, 4]]
    std::fs::write(array_dir.join("0.1"), [1u8, 0, 2, 0, 3, 0, 4, 0]).unwrap();

    let meta = root.array_metadata("legacy").unwrap();
    assert_eq!(meta.dimension_separator, DimensionSeparator::Dot);
    let data = root.open_array::<u16>("legacy").unwrap().read_region(&Region::full(&[2, 4])).unwrap();
    assert_eq!(data.as_slice().unwrap(), &[0, 0, 1, 2, 0, 0, 3, 4]);
}

#[test]
fn test_unaligned_region_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let options = StorageOptions::default_for(&[8, 8], &[4, 4]);
    let array = root.create_array::<u16>("img", &[8, 8], &[4, 4], &options).unwrap();
    let data = ArrayD::<u16>::zeros(IxDyn(&[2, 2]));
    assert!(array.write_region(&Region::new(vec![1, 0], vec![2, 2]), data.view()).is_err());
}

#[test]
fn test_dtype_checked_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let options = StorageOptions::default_for(&[4, 4], &[4, 4]);
    root.create_array::<u16>("img", &[4, 4], &[4, 4], &options).unwrap();
    let err = root.open_array::<f32>("img").unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_create_replaces_existing_array() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let options = StorageOptions::default_for(&[4, 4], &[2, 2]);
    let array = root.create_array::<u16>("img", &[4, 4], &[2, 2], &options).unwrap();
    array.write_region(&Region::full(&[4, 4]), ramp(&[4, 4]).view()).unwrap();
    assert!(dir.path().join("img/1/1").exists());

    let options = StorageOptions::default_for(&[2, 2], &[2, 2]);
    root.create_array::<u16>("img", &[2, 2], &[2, 2], &options).unwrap();
    let meta = root.array_metadata("img").unwrap();
    assert_eq!(meta.shape, vec![2, 2]);
    assert!(!dir.path().join("img/1/1").exists());
}

// ---------------------------------------------------------------------------
// Persisting lazy arrays
// ---------------------------------------------------------------------------

#[test]
fn test_persist_then_read_back_lazily() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let shape = [1, 1, 1, 6, 10];
    let data = ramp(&shape);
    let lazy = LazyArray::from_array(data.clone(), &[1, 1, 1, 4, 8]).unwrap();

    let options = StorageOptions::default_for(&shape, &[2, 4]);
    let target = root.create_array::<u16>("0", &shape, &[2, 4], &options).unwrap();
    let report = persist(&lazy, target, &InlineExecutor).unwrap();
    assert_eq!(report.tasks, 4);

    let stored = stored_array(&root.open_array::<u16>("0").unwrap()).unwrap();
    assert_eq!(stored.chunks(), &[1, 1, 1, 2, 4]);
    assert_eq!(stored.graph().depth(), 1);
    assert_eq!(stored.compute().unwrap(), data);
}

#[test]
fn test_persist_rejects_block_splitting_a_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let root = Group::create(dir.path()).unwrap();
    let lazy = LazyArray::<u16>::zeros(&[8, 8], &[3, 8]).unwrap();
    let options = StorageOptions::default_for(&[8, 8], &[2, 2]);
    let target = root.create_array::<u16>("img", &[8, 8], &[2, 2], &options).unwrap();
    let err = persist(&lazy, target, &InlineExecutor).unwrap_err();
    assert!(err.is_configuration());
}
