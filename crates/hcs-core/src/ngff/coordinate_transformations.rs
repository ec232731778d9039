use serde::{Deserialize, Serialize};

use crate::error::{HcsError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum CoordinateTransformation {
    Scale { scale: Vec<f64> },
    Translation { translation: Vec<f64> },
}

impl CoordinateTransformation {
    pub fn scale(scale: Vec<f64>) -> Self {
        Self::Scale { scale }
    }

    pub fn translation(translation: Vec<f64>) -> Self {
        Self::Translation { translation }
    }

    pub fn values(&self) -> &[f64] {
        match self {
            Self::Scale { scale } => scale,
            Self::Translation { translation } => translation,
        }
    }
}

/// Check one transformation list per dataset against format 0.4 rules:
/// a single `scale` first, optionally followed by one `translation`, each
/// with exactly `ndim` entries.
pub fn validate_coordinate_transformations(
    ndim: usize,
    nlevels: usize,
    transformations: &[Vec<CoordinateTransformation>],
) -> Result<()> {
    if transformations.len() != nlevels {
        return Err(HcsError::config(format!(
            "{} coordinate transformation lists given for {nlevels} datasets",
            transformations.len()
        )));
    }
    for (level, list) in transformations.iter().enumerate() {
        match list.as_slice() {
            [CoordinateTransformation::Scale { .. }]
            | [CoordinateTransformation::Scale { .. }, CoordinateTransformation::Translation { .. }] => {}
            _ => {
                return Err(HcsError::config(format!(
                    "level {level}: expected one scale optionally followed by one translation, got {list:?}"
                )));
            }
        }
        for transformation in list {
            if transformation.values().len() != ndim {
                return Err(HcsError::config(format!(
                    "level {level}: transformation {transformation:?} has {} entries, image has {ndim} axes",
                    transformation.values().len()
                )));
            }
        }
    }
    Ok(())
}
