mod common;

use std::sync::Arc;

use common::{constant_png, ramp_png, single_tile};
use hcs_core::acquisition::{Tile, TilePosition};
use hcs_core::stitch::{LinearFuse, MeanFuse, SumFuse, TileStitcher, TranslateWarp};
use ndarray::s;

// ---------------------------------------------------------------------------
// 2-D tiles
// ---------------------------------------------------------------------------

#[test]
fn test_overlap_is_averaged() {
    let dir = tempfile::tempdir().unwrap();
    let a = constant_png(dir.path(), "a.png", (4, 4), 10);
    let b = constant_png(dir.path(), "b.png", (4, 4), 20);
    let tiles = vec![single_tile(a, (4, 4), 0, 0), single_tile(b, (4, 4), 0, 2)];

    let stitched = TileStitcher::new(&tiles, [1, 1, 1, 4, 8], &[4, 4])
        .unwrap()
        .stitch(Arc::new(TranslateWarp), Arc::new(MeanFuse))
        .unwrap();
    assert_eq!(stitched.chunks(), &[1, 1, 1, 4, 4]);

    let image = stitched.compute().unwrap();
    let row = image.slice(s![0, 0, 0, 1, ..]).to_vec();
    assert_eq!(row, vec![10, 10, 15, 15, 20, 20, 0, 0]);
}

#[test]
fn test_pixels_without_tiles_are_zero() {
    let dir = tempfile::tempdir().unwrap();
    let a = constant_png(dir.path(), "a.png", (2, 2), 100);
    let tiles = vec![single_tile(a, (2, 2), 4, 4)];

    let image = TileStitcher::new(&tiles, [1, 1, 1, 8, 8], &[4, 4])
        .unwrap()
        .stitch(Arc::new(TranslateWarp), Arc::new(MeanFuse))
        .unwrap()
        .compute()
        .unwrap();
    assert_eq!(image.iter().filter(|&&v| v == 100).count(), 4);
    assert_eq!(image.iter().filter(|&&v| v == 0).count(), 60);
    assert_eq!(image[[0, 0, 0, 5, 5]], 100);
}

#[test]
fn test_tile_across_block_boundary_keeps_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let ramp = ramp_png(dir.path(), "ramp.png", (4, 4));
    let tiles = vec![single_tile(ramp, (4, 4), 2, 2)];

    let image = TileStitcher::new(&tiles, [1, 1, 1, 8, 8], &[4, 4])
        .unwrap()
        .stitch(Arc::new(TranslateWarp), Arc::new(MeanFuse))
        .unwrap()
        .compute()
        .unwrap();
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(image[[0, 0, 0, y + 2, x + 2]], (y * 4 + x) as u16);
        }
    }
}

#[test]
fn test_tile_beyond_edge_is_clipped() {
    let dir = tempfile::tempdir().unwrap();
    let a = constant_png(dir.path(), "a.png", (4, 4), 3);
    let tiles = vec![single_tile(a, (4, 4), 2, 6)];

    let image = TileStitcher::new(&tiles, [1, 1, 1, 4, 8], &[4, 4])
        .unwrap()
        .stitch(Arc::new(TranslateWarp), Arc::new(MeanFuse))
        .unwrap()
        .compute()
        .unwrap();
    assert_eq!(image.shape(), &[1, 1, 1, 4, 8]);
    assert_eq!(image.iter().filter(|&&v| v == 3).count(), 4);
    assert_eq!(image[[0, 0, 0, 3, 7]], 3);
}

#[test]
fn test_sum_fuse_saturates() {
    let dir = tempfile::tempdir().unwrap();
    let a = constant_png(dir.path(), "a.png", (2, 2), 40000);
    let tiles = vec![single_tile(a.clone(), (2, 2), 0, 0), single_tile(a, (2, 2), 0, 0)];

    let image = TileStitcher::new(&tiles, [1, 1, 1, 2, 2], &[2, 2])
        .unwrap()
        .stitch(Arc::new(TranslateWarp), Arc::new(SumFuse))
        .unwrap()
        .compute()
        .unwrap();
    assert!(image.iter().all(|&v| v == u16::MAX));
}

#[test]
fn test_linear_fuse_stays_between_inputs() {
    let dir = tempfile::tempdir().unwrap();
    let a = constant_png(dir.path(), "a.png", (4, 4), 10);
    let b = constant_png(dir.path(), "b.png", (4, 4), 20);
    let tiles = vec![single_tile(a, (4, 4), 0, 0), single_tile(b, (4, 4), 0, 2)];

    let image = TileStitcher::new(&tiles, [1, 1, 1, 4, 6], &[4, 6])
        .unwrap()
        .stitch(Arc::new(TranslateWarp), Arc::new(LinearFuse))
        .unwrap()
        .compute()
        .unwrap();
    assert_eq!(image[[0, 0, 0, 1, 0]], 10);
    assert_eq!(image[[0, 0, 0, 1, 5]], 20);
    for x in 2..4 {
        let v = image[[0, 0, 0, 1, x]];
        assert!((10..=20).contains(&v), "blended value {v} at x={x}");
    }
}

// ---------------------------------------------------------------------------
// Time, channel and Z placement
// ---------------------------------------------------------------------------

#[test]
fn test_channels_are_kept_apart() {
    let dir = tempfile::tempdir().unwrap();
    let a = constant_png(dir.path(), "a.png", (2, 2), 11);
    let b = constant_png(dir.path(), "b.png", (2, 2), 22);
    let tiles = vec![
        Tile::<u16>::single(a, [2, 2], TilePosition::new(0, 0, 0, 0, 0)),
        Tile::single(b, [2, 2], TilePosition::new(1, 1, 0, 0, 0)),
    ];

    let image = TileStitcher::new(&tiles, [2, 2, 1, 2, 2], &[2, 2])
        .unwrap()
        .stitch(Arc::new(TranslateWarp), Arc::new(MeanFuse))
        .unwrap()
        .compute()
        .unwrap();
    assert!(image.slice(s![0, 0, .., .., ..]).iter().all(|&v| v == 11));
    assert!(image.slice(s![1, 1, .., .., ..]).iter().all(|&v| v == 22));
    assert!(image.slice(s![0, 1, .., .., ..]).iter().all(|&v| v == 0));
    assert!(image.slice(s![1, 0, .., .., ..]).iter().all(|&v| v == 0));
}

#[test]
fn test_3d_tile_is_placed_at_its_z() {
    let dir = tempfile::tempdir().unwrap();
    let plane = constant_png(dir.path(), "z0.png", (4, 4), 7);
    let tile = Tile::<u16>::new(vec![Some(plane), None], vec![2, 4, 4], TilePosition::new(0, 0, 1, 0, 0)).unwrap();

    let stitcher = TileStitcher::new(&[tile], [1, 1, 3, 4, 4], &[1, 4, 4]).unwrap();
    assert_eq!(stitcher.chunks(), &[1, 1, 1, 4, 4]);
    let image = stitcher
        .stitch(Arc::new(TranslateWarp), Arc::new(MeanFuse))
        .unwrap()
        .compute()
        .unwrap();
    assert!(image.slice(s![0, 0, 0, .., ..]).iter().all(|&v| v == 0));
    assert!(image.slice(s![0, 0, 1, .., ..]).iter().all(|&v| v == 7));
    assert!(image.slice(s![0, 0, 2, .., ..]).iter().all(|&v| v == 0));
}

#[test]
fn test_mixed_tile_dimensionality_rejected() {
    let flat = Tile::<u16>::new(vec![None], vec![4, 4], TilePosition::default()).unwrap();
    let stack = Tile::<u16>::new(vec![None, None], vec![2, 4, 4], TilePosition::default()).unwrap();
    let err = TileStitcher::new(&[flat, stack], [1, 1, 2, 4, 4], &[4, 4]).err().unwrap();
    assert!(err.is_configuration());
}

#[test]
fn test_block_region_is_computed_alone() {
    let dir = tempfile::tempdir().unwrap();
    let a = constant_png(dir.path(), "a.png", (4, 4), 9);
    let tiles = vec![single_tile(a, (4, 4), 4, 4)];
    let stitched = TileStitcher::new(&tiles, [1, 1, 1, 8, 8], &[4, 4])
        .unwrap()
        .stitch(Arc::new(TranslateWarp), Arc::new(MeanFuse))
        .unwrap();

    let regions = stitched.chunk_regions();
    assert_eq!(regions.len(), 4);
    let first = stitched.compute_region(&regions[0]).unwrap();
    let last = stitched.compute_region(&regions[3]).unwrap();
    assert!(first.iter().all(|&v| v == 0));
    assert!(last.iter().all(|&v| v == 9));
}
