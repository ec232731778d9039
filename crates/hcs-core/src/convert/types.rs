use crate::ngff::CoordinateTransformation;

/// Conversion stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionStage {
    CreatingPlate,
    ConvertingWells,
}

impl std::fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreatingPlate => write!(f, "Creating plate"),
            Self::ConvertingWells => write!(f, "Converting wells"),
        }
    }
}

/// Thread-safe progress reporting for a conversion.
///
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. `total_items` is the number of work items
    /// (e.g. wells) in this stage, if known.
    fn begin_stage(&self, _stage: ConversionStage, _total_items: Option<usize>) {}

    /// `items_done` work items of the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when no reporter is attached.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// One persisted resolution level.
#[derive(Clone, Debug, PartialEq)]
pub struct PyramidLevel {
    /// Array path inside the field group (`"0"`, `"1"`, ...).
    pub path: String,
    pub shape: Vec<usize>,
    /// Depth of the lazy graph this level was computed from.
    pub graph_depth: usize,
}

/// What was written for one well.
#[derive(Clone, Debug, PartialEq)]
pub struct WellOutput {
    pub well: String,
    /// Path of the field group relative to the plate root, e.g. `E/07/0`.
    pub group_path: String,
    pub axes: Vec<String>,
    pub levels: Vec<PyramidLevel>,
    pub coordinate_transformations: Vec<Vec<CoordinateTransformation>>,
}

impl WellOutput {
    pub fn shapes(&self) -> Vec<Vec<usize>> {
        self.levels.iter().map(|l| l.shape.clone()).collect()
    }
}
