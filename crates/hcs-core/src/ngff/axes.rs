use serde::{Deserialize, Serialize};

use crate::consts::SPACE_UNIT;
use crate::error::{HcsError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Time,
    Channel,
    Space,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,

    #[serde(rename = "type")]
    pub axis_type: AxisType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Axis {
    /// Axis for one of the well labels `t`, `c`, `z`, `y`, `x`.
    pub fn from_label(label: &str) -> Result<Self> {
        let (axis_type, unit) = match label {
            "t" => (AxisType::Time, None),
            "c" => (AxisType::Channel, None),
            "z" | "y" | "x" => (AxisType::Space, Some(SPACE_UNIT.to_string())),
            other => {
                return Err(HcsError::config(format!("unknown axis label '{other}'")));
            }
        };
        Ok(Self {
            name: label.to_string(),
            axis_type,
            unit,
        })
    }
}

/// Default labels for an image of `ndim` axes.
fn default_labels(ndim: usize) -> &'static [&'static str] {
    match ndim {
        2 => &["y", "x"],
        3 => &["z", "y", "x"],
        4 => &["c", "z", "y", "x"],
        _ => &["t", "c", "z", "y", "x"],
    }
}

/// Build and validate the axes of an `ndim` image.
///
/// `labels` must have one entry per axis; `None` picks the default labels.
/// Time comes first, then channel, then 2 or 3 space axes.
pub fn valid_axes(ndim: usize, labels: Option<&[String]>) -> Result<Vec<Axis>> {
    if !(2..=5).contains(&ndim) {
        return Err(HcsError::config(format!(
            "images must have 2 to 5 axes, got {ndim}"
        )));
    }
    let axes: Vec<Axis> = match labels {
        Some(labels) => {
            if labels.len() != ndim {
                return Err(HcsError::config(format!(
                    "{} axis labels {labels:?} given for an image with {ndim} axes",
                    labels.len()
                )));
            }
            labels.iter().map(|l| Axis::from_label(l)).collect::<Result<_>>()?
        }
        None => default_labels(ndim)
            .iter()
            .map(|l| Axis::from_label(l))
            .collect::<Result<_>>()?,
    };

    let space = axes.iter().filter(|a| a.axis_type == AxisType::Space).count();
    if !(2..=3).contains(&space) {
        return Err(HcsError::config(format!(
            "expected 2 or 3 space axes, got {space}"
        )));
    }
    if axes[ndim - space..].iter().any(|a| a.axis_type != AxisType::Space) {
        return Err(HcsError::config("space axes must be the trailing axes"));
    }
    let leading: Vec<AxisType> = axes[..ndim - space].iter().map(|a| a.axis_type).collect();
    match leading.as_slice() {
        [] | [_] | [AxisType::Time, AxisType::Channel] => Ok(axes),
        _ => Err(HcsError::config(format!(
            "axes {:?} must be at most one time then one channel axis before space",
            axes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn serialize_space_axis() {
        let axis = Axis::from_label("x").unwrap();
        assert_eq!(
            serde_json::to_value(&axis).unwrap(),
            json!({"name": "x", "type": "space", "unit": "micrometer"})
        );
    }

    #[test]
    fn serialize_channel_axis_without_unit() {
        let axis = Axis::from_label("c").unwrap();
        assert_eq!(
            serde_json::to_value(&axis).unwrap(),
            json!({"name": "c", "type": "channel"})
        );
    }

    #[test]
    fn five_axes() {
        let axes = valid_axes(5, Some(&labels(&["t", "c", "z", "y", "x"]))).unwrap();
        assert_eq!(axes[0].axis_type, AxisType::Time);
        assert_eq!(axes[4].name, "x");
    }

    #[test]
    fn squeezed_axes() {
        let axes = valid_axes(3, Some(&labels(&["c", "y", "x"]))).unwrap();
        assert_eq!(axes[0].axis_type, AxisType::Channel);
    }

    #[test]
    fn defaults_by_ndim() {
        assert_eq!(valid_axes(2, None).unwrap()[0].name, "y");
        assert_eq!(valid_axes(4, None).unwrap()[0].name, "c");
    }

    #[test]
    fn rejects_label_count_mismatch() {
        assert!(valid_axes(5, Some(&labels(&["y", "x"]))).is_err());
    }

    #[test]
    fn rejects_space_first() {
        assert!(valid_axes(3, Some(&labels(&["y", "x", "c"]))).is_err());
        assert!(valid_axes(4, Some(&labels(&["c", "t", "y", "x"]))).is_err());
    }

    #[test]
    fn rejects_unknown_label() {
        assert!(valid_axes(2, Some(&labels(&["q", "x"]))).is_err());
    }
}
