/// OME-NGFF metadata version written to every plate, well and multiscale.
pub const NGFF_VERSION: &str = "0.4";

/// Zarr on-disk format version.
pub const ZARR_FORMAT: u32 = 2;

/// Default YX chunk shape used when a run does not specify one.
pub const DEFAULT_CHUNKS: [usize; 2] = [2048, 2048];

/// Default highest pyramid level (levels 0..=3 are written).
pub const DEFAULT_MAX_LAYER: usize = 3;

/// Default name of the field subgroup inside each well group.
pub const DEFAULT_WELL_SUB_GROUP: &str = "0";

/// Plate stores are written as `<root>/<name>` + this suffix.
pub const PLATE_STORE_SUFFIX: &str = ".zarr";

/// Number of axes in a full well image: (t, c, z, y, x).
pub const WELL_NDIM: usize = 5;

/// Downsampling factor between successive pyramid levels.
pub const PYRAMID_FACTOR: usize = 2;

/// Blosc compression level of the default storage options.
pub const DEFAULT_BLOSC_CLEVEL: u8 = 3;

/// Unit written for every space axis in multiscale metadata.
pub const SPACE_UNIT: &str = "micrometer";

/// Minimum number of blocks in a task graph to fan out across the pool.
pub const PARALLEL_TASK_THRESHOLD: usize = 2;

/// Small epsilon to avoid division by zero in weighted fusion.
pub const EPSILON: f32 = 1e-10;
