use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub min: f64,
    pub max: f64,
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OmeroChannel {
    pub active: bool,
    pub coefficient: f64,
    pub color: String,
    pub family: String,
    pub inverted: bool,
    pub label: String,
    pub wavelength_id: String,
    pub window: Window,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Omero {
    pub channels: Vec<OmeroChannel>,
}
