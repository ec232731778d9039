use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use hcs_core::acquisition::AcquisitionManifest;
use hcs_core::convert::{ConversionConfig, ConvertToNgffPlate, FuseMethod, WellOutput};
use hcs_core::element::{DataType, Element};
use hcs_core::executor::ExecutorPreference;
use hcs_core::ngff::PlateLayout;
use tracing::info;

use crate::progress::BarReporter;
use crate::summary::{print_conversion_summary, print_well_outputs};

#[derive(Clone, ValueEnum)]
pub enum FuseMethodArg {
    Mean,
    Sum,
    Linear,
}

impl From<&FuseMethodArg> for FuseMethod {
    fn from(arg: &FuseMethodArg) -> Self {
        match arg {
            FuseMethodArg::Mean => Self::Mean,
            FuseMethodArg::Sum => Self::Sum,
            FuseMethodArg::Linear => Self::Linear,
        }
    }
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Acquisition manifest (TOML)
    pub manifest: PathBuf,

    /// Conversion config file (TOML); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory the plate store is written to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Plate name (the store is <output>/<name>.zarr)
    #[arg(long)]
    pub name: Option<String>,

    /// Plate layout: 18, 24, 96 or 384
    #[arg(long)]
    pub layout: Option<PlateLayout>,

    /// Comma-separated wells to convert, e.g. E07,E08
    #[arg(long)]
    pub wells: Option<String>,

    /// YX binning factor applied before the base level is written
    #[arg(long)]
    pub binning: Option<usize>,

    /// Storage chunks per stitching block along Y and X
    #[arg(long)]
    pub chunk_factor: Option<usize>,

    /// Comma-separated (Z)YX chunk shape, e.g. 2048,2048
    #[arg(long)]
    pub chunks: Option<String>,

    /// Highest pyramid level
    #[arg(long)]
    pub max_layer: Option<usize>,

    /// Overlap fusion
    #[arg(long, value_enum)]
    pub fuse: Option<FuseMethodArg>,

    /// Worker threads (0 runs everything on the main thread)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Drop leading singleton axes from the written images
    #[arg(long)]
    pub squeeze: bool,
}

fn parse_list<T: std::str::FromStr>(value: &str) -> Result<Vec<T>>
where
    T::Err: std::fmt::Display,
{
    value
        .split(',')
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid list entry '{}': {e}", s.trim()))
        })
        .collect()
}

fn build_config(args: &ConvertArgs, manifest: &AcquisitionManifest) -> Result<ConversionConfig> {
    let mut config: ConversionConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid conversion config")?
    } else {
        let mut config = ConversionConfig::default();
        config.plate.layout = manifest.layout;
        config.plate.order_name = manifest.order_name.clone();
        config.plate.barcode = manifest.barcode.clone();
        config
    };

    if let Some(ref output) = args.output {
        config.plate.root_dir = output.clone();
    }
    if let Some(ref name) = args.name {
        config.plate.name = name.clone();
    }
    if let Some(layout) = args.layout {
        config.plate.layout = layout;
    }
    if let Some(ref wells) = args.wells {
        config.run.wells = Some(parse_list(wells)?);
    }
    if let Some(binning) = args.binning {
        config.yx_binning = binning;
    }
    if let Some(factor) = args.chunk_factor {
        config.stitching_yx_chunk_size_factor = factor;
    }
    if let Some(ref chunks) = args.chunks {
        config.run.chunks = parse_list(chunks)?;
    }
    if let Some(max_layer) = args.max_layer {
        config.run.max_layer = max_layer;
    }
    if let Some(ref fuse) = args.fuse {
        config.fuse = fuse.into();
    }
    if let Some(threads) = args.threads {
        config.executor = match threads {
            0 => ExecutorPreference::Inline,
            n => ExecutorPreference::RayonThreads(n),
        };
    }
    if args.squeeze {
        config.run.squeeze_singleton_axes = true;
    }
    Ok(config)
}

fn convert<T: Element>(
    manifest: &AcquisitionManifest,
    config: &ConversionConfig,
) -> Result<Vec<WellOutput>> {
    let acquisition = manifest
        .to_plate::<T>()
        .context("Failed to build the plate acquisition")?;
    let converter =
        ConvertToNgffPlate::from_config(config)?.with_reporter(Arc::new(BarReporter::new()));
    let plate = converter
        .create_plate(&acquisition, config.run.wells.as_deref())
        .with_context(|| format!("Failed to open plate {}", config.plate.store_path().display()))?;
    let outputs = converter
        .run(&plate, &acquisition, &config.run)
        .context("Conversion failed")?;
    Ok(outputs)
}

pub fn run(args: &ConvertArgs) -> Result<()> {
    let manifest = AcquisitionManifest::load(&args.manifest)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;
    let config = build_config(args, &manifest)?;
    config.validate()?;

    print_conversion_summary(&config, &manifest);

    let outputs = match manifest.dtype {
        DataType::Uint8 => convert::<u8>(&manifest, &config)?,
        DataType::Uint16 => convert::<u16>(&manifest, &config)?,
        DataType::Float32 => convert::<f32>(&manifest, &config)?,
    };

    info!(
        wells = outputs.len(),
        store = %config.plate.store_path().display(),
        "Conversion finished"
    );
    print_well_outputs(&outputs);
    println!(
        "\nPlate written to {}",
        config.plate.store_path().display()
    );
    Ok(())
}
