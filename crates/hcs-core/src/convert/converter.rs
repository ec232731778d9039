use std::fs;
use std::sync::Arc;

use serde_json::{json, Map};
use tracing::{debug, info, warn};

use crate::acquisition::{PlateAcquisition, WellAcquisition};
use crate::consts::{NGFF_VERSION, WELL_NDIM};
use crate::element::Element;
use crate::error::{HcsError, Result};
use crate::executor::{create_executor, Executor};
use crate::ngff::{
    valid_axes, validate_coordinate_transformations, Dataset, Multiscale, Omero, Plate, Well,
};
use crate::stitch::{Fuse, TileStitcher, Warp};
use crate::store::Group;

use super::binning::bin_yx;
use super::config::{ConversionConfig, NgffPlate, RunConfig};
use super::pyramid::{build_pyramid, write_level};
use super::types::{ConversionStage, NoOpReporter, ProgressReporter, PyramidLevel, WellOutput};

/// Converts plate acquisitions into an OME-NGFF plate store.
pub struct ConvertToNgffPlate {
    plate: NgffPlate,
    yx_binning: usize,
    stitching_yx_chunk_size_factor: usize,
    warp: Arc<dyn Warp>,
    fuse: Arc<dyn Fuse>,
    executor: Arc<dyn Executor>,
    reporter: Arc<dyn ProgressReporter>,
}

impl ConvertToNgffPlate {
    pub fn new(
        plate: NgffPlate,
        yx_binning: usize,
        stitching_yx_chunk_size_factor: usize,
        warp: Arc<dyn Warp>,
        fuse: Arc<dyn Fuse>,
        executor: Arc<dyn Executor>,
    ) -> Result<Self> {
        if yx_binning < 1 {
            return Err(HcsError::config("yx_binning must be an integer >= 1"));
        }
        if stitching_yx_chunk_size_factor < 1 {
            return Err(HcsError::config(
                "stitching_yx_chunk_size_factor must be an integer >= 1",
            ));
        }
        Ok(Self {
            plate,
            yx_binning,
            stitching_yx_chunk_size_factor,
            warp,
            fuse,
            executor,
            reporter: Arc::new(NoOpReporter),
        })
    }

    pub fn from_config(config: &ConversionConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.plate.clone(),
            config.yx_binning,
            config.stitching_yx_chunk_size_factor,
            config.warp.build(),
            config.fuse.build(),
            create_executor(&config.executor)?,
        )
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn ngff_plate(&self) -> &NgffPlate {
        &self.plate
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// Open the plate store, creating it with plate metadata if it does not
    /// exist yet. An existing store is returned untouched; a directory
    /// without a root group is initialized like a new store.
    pub fn create_plate<T: Element>(
        &self,
        acquisition: &PlateAcquisition<T>,
        wells: Option<&[String]>,
    ) -> Result<Group> {
        let path = self.plate.store_path();
        if Group::exists(&path) {
            debug!(path = %path.display(), "Opening existing plate");
            return Group::open(&path);
        }

        self.reporter.begin_stage(ConversionStage::CreatingPlate, None);
        fs::create_dir_all(&self.plate.root_dir)?;
        let group = Group::create(&path)?;

        let well_paths: Vec<String> = acquisition
            .well_acquisitions(wells)?
            .iter()
            .map(|w| {
                let (row, col) = w.row_col();
                format!("{row}/{col}")
            })
            .collect();
        let plate = Plate::new(&self.plate.name, self.plate.layout, &well_paths)?;

        let mut attrs = Map::new();
        attrs.insert("plate".to_string(), serde_json::to_value(&plate)?);
        attrs.insert("order_name".to_string(), json!(self.plate.order_name));
        attrs.insert("barcode".to_string(), json!(self.plate.barcode));
        group.put_attrs(attrs)?;

        info!(
            path = %path.display(),
            layout = %self.plate.layout,
            wells = well_paths.len(),
            "Plate created"
        );
        self.reporter.finish_stage();
        Ok(group)
    }

    /// Stitch, persist and pyramid every selected well into `plate`.
    ///
    /// Wells are processed one after another; the first failing well stops
    /// the run. Levels persisted before the failure stay on disk, the failed
    /// well gets no multiscale metadata.
    pub fn run<T: Element>(
        &self,
        plate: &Group,
        acquisition: &PlateAcquisition<T>,
        run: &RunConfig,
    ) -> Result<Vec<WellOutput>> {
        run.validate()?;
        let wells = acquisition.well_acquisitions(run.wells.as_deref())?;
        for well in &wells {
            if let Some(tile) = well.tiles().first() {
                if tile.ndim() != run.chunks.len() {
                    return Err(HcsError::config(format!(
                        "chunks {:?} must have the same number of dimensions as the tiles of well {} (shape {:?})",
                        run.chunks,
                        well.name(),
                        tile.shape()
                    )));
                }
            }
        }

        self.reporter
            .begin_stage(ConversionStage::ConvertingWells, Some(wells.len()));
        let mut outputs = Vec::with_capacity(wells.len());
        for (i, well) in wells.iter().enumerate() {
            let output = self.convert_well(plate, acquisition, well, run)?;
            outputs.push(output);
            self.reporter.advance(i + 1);
        }
        self.reporter.finish_stage();
        Ok(outputs)
    }

    fn convert_well<T: Element>(
        &self,
        plate: &Group,
        acquisition: &PlateAcquisition<T>,
        well: &WellAcquisition<T>,
        run: &RunConfig,
    ) -> Result<WellOutput> {
        if well.tiles().is_empty() {
            warn!(well = well.name(), "Well has no tiles, writing an empty image");
        }
        let well_group = self.create_well_group(plate, well, &run.well_sub_group)?;
        let field = well_group.group(&run.well_sub_group)?;
        // stale multiscales from an earlier run must not outlive a failure
        field.put_attrs(Map::new())?;

        let (base, kept) = self.write_stitched_image(&field, acquisition, well, run)?;
        info!(well = well.name(), shape = ?base.shape, "Level 0 written");

        let levels = build_pyramid::<T>(
            &field,
            base,
            &run.chunks,
            run.max_layer,
            run.storage_options.as_ref(),
            self.executor.as_ref(),
        )?;

        self.write_metadata(&field, acquisition, well, &levels, &kept, run.max_layer)
    }

    /// Create `<row>/<col>/<sub_group>` and (re)write the well metadata.
    pub fn create_well_group<T: Element>(
        &self,
        plate: &Group,
        well: &WellAcquisition<T>,
        well_sub_group: &str,
    ) -> Result<Group> {
        let (row, col) = well.row_col();
        let well_group = plate.require_group(&row)?.require_group(&col)?;
        well_group.require_group(well_sub_group)?;
        well_group.set_attr("well", Well::with_fields(&[well_sub_group]))?;
        Ok(well_group)
    }

    /// Stitch the well, bin it and persist it as level `"0"` of `field`.
    ///
    /// Returns the level descriptor and the indices of the well axes the
    /// written image kept.
    pub fn write_stitched_image<T: Element>(
        &self,
        field: &Group,
        acquisition: &PlateAcquisition<T>,
        well: &WellAcquisition<T>,
        run: &RunConfig,
    ) -> Result<(PyramidLevel, Vec<usize>)> {
        let mut stitch_chunks = run.chunks.clone();
        let nd = stitch_chunks.len();
        for axis in nd - 2..nd {
            stitch_chunks[axis] *= self.stitching_yx_chunk_size_factor;
        }
        let stitcher = TileStitcher::new(
            well.tiles(),
            acquisition.common_well_shape(),
            &stitch_chunks,
        )?;
        let stitched = stitcher.stitch(Arc::clone(&self.warp), Arc::clone(&self.fuse))?;
        let binned = bin_yx(&stitched, self.yx_binning)?;

        let (image, kept) = if run.squeeze_singleton_axes {
            binned.squeeze_leading()?
        } else {
            (binned, (0..WELL_NDIM).collect())
        };
        debug!(
            well = well.name(),
            tiles = well.tiles().len(),
            graph = %image.graph(),
            "Stitched image graph built"
        );

        let level = write_level(
            field,
            "0",
            &image,
            &run.chunks,
            run.storage_options.as_ref(),
            self.stitching_yx_chunk_size_factor,
            self.executor.as_ref(),
        )?;
        Ok((level, kept))
    }

    /// Attach coordinate transformations to every level and write the
    /// `multiscales`, `omero` and `acquisition_metadata` attributes.
    pub fn write_metadata<T: Element>(
        &self,
        field: &Group,
        acquisition: &PlateAcquisition<T>,
        well: &WellAcquisition<T>,
        levels: &[PyramidLevel],
        kept: &[usize],
        max_layer: usize,
    ) -> Result<WellOutput> {
        let ndim = levels.first().map(|l| l.shape.len()).unwrap_or(kept.len());
        let transformations = well.coordinate_transformations(max_layer, self.yx_binning, kept);
        validate_coordinate_transformations(ndim, levels.len(), &transformations)?;
        let labels = well.axes(kept);
        let axes = valid_axes(ndim, Some(&labels))?;

        let datasets = levels
            .iter()
            .zip(&transformations)
            .map(|(level, transform)| Dataset {
                path: level.path.clone(),
                coordinate_transformations: transform.clone(),
            })
            .collect();
        let multiscale = Multiscale {
            version: NGFF_VERSION.to_string(),
            name: None,
            axes,
            datasets,
        };

        field.set_attr("multiscales", vec![multiscale])?;
        field.set_attr(
            "omero",
            Omero {
                channels: acquisition.omero_channels(),
            },
        )?;
        let channels: Vec<_> = acquisition.channel_metadata().values().collect();
        let mut acquisition_metadata = Map::new();
        acquisition_metadata.insert("channels".to_string(), serde_json::to_value(channels)?);
        field.set_attr("acquisition_metadata", acquisition_metadata)?;

        Ok(WellOutput {
            well: well.name().to_string(),
            group_path: field.path().to_string(),
            axes: labels,
            levels: levels.to_vec(),
            coordinate_transformations: transformations,
        })
    }
}
