use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hcs_core::ngff::{Multiscale, Plate, Well};
use hcs_core::store::Group;
use serde_json::Value;

#[derive(Args)]
pub struct InfoArgs {
    /// Plate store (<name>.zarr directory)
    pub store: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let root = Group::open(&args.store)
        .with_context(|| format!("Failed to open plate {}", args.store.display()))?;
    let plate: Plate = serde_json::from_value(
        root.attr("plate")?
            .context("Store has no plate metadata")?,
    )
    .context("Invalid plate metadata")?;

    println!("Plate:       {}", plate.name);
    println!("Version:     {}", plate.version);
    println!("Layout:      {} rows x {} columns", plate.rows.len(), plate.columns.len());
    for (key, label) in [("order_name", "Order name:"), ("barcode", "Barcode:")] {
        if let Some(Value::String(value)) = root.attr(key)? {
            if !value.is_empty() {
                println!("{label:<13}{value}");
            }
        }
    }
    println!("Wells:       {}", plate.wells.len());

    for well_ref in &plate.wells {
        println!();
        println!("{}", well_ref.path);
        let Ok(well_group) = root.group(&well_ref.path) else {
            println!("  (not converted)");
            continue;
        };
        let Some(well_attr) = well_group.attr("well")? else {
            println!("  (no well metadata)");
            continue;
        };
        let well: Well = serde_json::from_value(well_attr).context("Invalid well metadata")?;
        for image in &well.images {
            let field = well_group.group(&image.path)?;
            let Some(multiscales) = field.attr("multiscales")? else {
                println!("  {}: incomplete (no multiscales)", image.path);
                continue;
            };
            let multiscales: Vec<Multiscale> =
                serde_json::from_value(multiscales).context("Invalid multiscales metadata")?;
            for multiscale in &multiscales {
                let axes: Vec<&str> = multiscale.axes.iter().map(|a| a.name.as_str()).collect();
                println!("  {} axes {:?}", image.path, axes);
                for dataset in &multiscale.datasets {
                    let meta = field.array_metadata(&dataset.path)?;
                    let codec = meta
                        .compressor
                        .as_ref()
                        .and_then(|c| c.get("id"))
                        .and_then(|id| id.as_str())
                        .unwrap_or("none");
                    println!(
                        "    {:<4}shape {:?} chunks {:?} dtype {} codec {}",
                        dataset.path, meta.shape, meta.chunks, meta.dtype, codec
                    );
                }
            }
        }
    }

    Ok(())
}
