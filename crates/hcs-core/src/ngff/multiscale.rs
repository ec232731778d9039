use serde::{Deserialize, Serialize};

use super::axes::Axis;
use super::coordinate_transformations::CoordinateTransformation;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub path: String,

    #[serde(rename = "coordinateTransformations")]
    pub coordinate_transformations: Vec<CoordinateTransformation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Multiscale {
    pub version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub axes: Vec<Axis>,

    // ordered by largest (i.e. highest resolution) to smallest.
    pub datasets: Vec<Dataset>,
}

impl Multiscale {
    pub fn dataset_paths(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.path.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_multiscale() {
        let multiscale = Multiscale {
            version: "0.4".into(),
            name: None,
            axes: vec![Axis::from_label("y").unwrap(), Axis::from_label("x").unwrap()],
            datasets: vec![Dataset {
                path: "0".into(),
                coordinate_transformations: vec![CoordinateTransformation::scale(vec![0.5, 0.5])],
            }],
        };
        assert_eq!(
            serde_json::to_value(&multiscale).unwrap(),
            json!({
                "version": "0.4",
                "axes": [
                    {"name": "y", "type": "space", "unit": "micrometer"},
                    {"name": "x", "type": "space", "unit": "micrometer"}
                ],
                "datasets": [
                    {"path": "0", "coordinateTransformations": [{"type": "scale", "scale": [0.5, 0.5]}]}
                ]
            })
        );
        assert_eq!(multiscale.dataset_paths(), vec!["0"]);
    }
}
