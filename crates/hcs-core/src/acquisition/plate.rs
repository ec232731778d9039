use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::WELL_NDIM;
use crate::element::Element;
use crate::error::{HcsError, Result};
use crate::ngff::{OmeroChannel, PlateLayout, Window};

use super::well::WellAcquisition;

/// Acquisition metadata of one channel, written verbatim into
/// `acquisition_metadata.channels`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub channel_index: usize,
    pub channel_name: String,
    /// Hex RGB, e.g. `"00FF00"`.
    pub display_color: String,
    pub spatial_calibration_x: f64,
    pub spatial_calibration_y: f64,
    pub spatial_calibration_units: String,
    #[serde(default)]
    pub z_spacing: Option<f64>,
    #[serde(default)]
    pub wavelength: Option<String>,
    #[serde(default)]
    pub exposure_time: Option<f64>,
    #[serde(default)]
    pub exposure_time_unit: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
}

/// A whole plate: its wells, their shared image shape and channel metadata.
#[derive(Clone, Debug)]
pub struct PlateAcquisition<T: Element> {
    layout: PlateLayout,
    order_name: String,
    barcode: String,
    wells: Vec<WellAcquisition<T>>,
    well_shape: [usize; WELL_NDIM],
    channels: BTreeMap<String, ChannelMetadata>,
}

impl<T: Element> PlateAcquisition<T> {
    pub fn new(
        layout: PlateLayout,
        wells: Vec<WellAcquisition<T>>,
        well_shape: [usize; WELL_NDIM],
        channels: BTreeMap<String, ChannelMetadata>,
    ) -> Result<Self> {
        let (rows, cols) = layout.rows_and_columns();
        for well in &wells {
            let (row, col) = well.row_col();
            if !rows.contains(&row) || !cols.contains(&col) {
                return Err(HcsError::config(format!(
                    "well {} does not exist on a {layout}-well plate",
                    well.name()
                )));
            }
        }
        if well_shape.iter().any(|&n| n == 0) {
            return Err(HcsError::config(format!(
                "well shape {well_shape:?} has an empty axis"
            )));
        }
        Ok(Self {
            layout,
            order_name: String::new(),
            barcode: String::new(),
            wells,
            well_shape,
            channels,
        })
    }

    pub fn with_provenance(mut self, order_name: impl Into<String>, barcode: impl Into<String>) -> Self {
        self.order_name = order_name.into();
        self.barcode = barcode.into();
        self
    }

    pub fn layout(&self) -> PlateLayout {
        self.layout
    }

    pub fn order_name(&self) -> &str {
        &self.order_name
    }

    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    /// (t, c, z, y, x) shape every well is stitched into.
    pub fn common_well_shape(&self) -> [usize; WELL_NDIM] {
        self.well_shape
    }

    /// Names of the selected wells in acquisition order. `None` selects all;
    /// a name that is not part of the acquisition is an error.
    pub fn well_names(&self, filter: Option<&[String]>) -> Result<Vec<String>> {
        Ok(self
            .well_acquisitions(filter)?
            .into_iter()
            .map(|w| w.name().to_string())
            .collect())
    }

    pub fn well_acquisitions(&self, filter: Option<&[String]>) -> Result<Vec<&WellAcquisition<T>>> {
        let Some(filter) = filter else {
            return Ok(self.wells.iter().collect());
        };
        if let Some(unknown) = filter.iter().find(|n| !self.wells.iter().any(|w| w.name() == n.as_str())) {
            return Err(HcsError::config(format!(
                "well '{unknown}' is not part of the acquisition"
            )));
        }
        Ok(self
            .wells
            .iter()
            .filter(|w| filter.iter().any(|n| n == w.name()))
            .collect())
    }

    /// Channel key (e.g. `w1`) to metadata, sorted by key.
    pub fn channel_metadata(&self) -> &BTreeMap<String, ChannelMetadata> {
        &self.channels
    }

    /// Display settings for every channel; the window spans the value
    /// range of the element type.
    pub fn omero_channels(&self) -> Vec<OmeroChannel> {
        let min = T::min_value().as_f64();
        let max = T::max_value().as_f64();
        self.channels
            .iter()
            .map(|(key, meta)| OmeroChannel {
                active: true,
                coefficient: 1.0,
                color: meta.display_color.clone(),
                family: "linear".to_string(),
                inverted: false,
                label: meta.channel_name.clone(),
                wavelength_id: key.clone(),
                window: Window {
                    min,
                    max,
                    start: min,
                    end: max,
                },
            })
            .collect()
    }
}
