use serde::{Deserialize, Serialize};

use crate::consts::NGFF_VERSION;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WellImage {
    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Well {
    pub images: Vec<WellImage>,

    pub version: String,
}

impl Well {
    /// Well metadata listing the given field subgroups.
    pub fn with_fields<S: AsRef<str>>(fields: &[S]) -> Self {
        Self {
            images: fields
                .iter()
                .map(|f| WellImage {
                    path: f.as_ref().to_string(),
                    acquisition: None,
                })
                .collect(),
            version: NGFF_VERSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_well() {
        assert_eq!(
            serde_json::to_value(Well::with_fields(&["0"])).unwrap(),
            json!({"images": [{"path": "0"}], "version": "0.4"})
        );
    }
}
