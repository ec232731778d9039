use console::Style;
use hcs_core::acquisition::AcquisitionManifest;
use hcs_core::convert::{ConversionConfig, WellOutput};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn format_shape(shape: &[usize]) -> String {
    let parts: Vec<String> = shape.iter().map(|n| n.to_string()).collect();
    format!("({})", parts.join(", "))
}

pub fn print_conversion_summary(config: &ConversionConfig, manifest: &AcquisitionManifest) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("HCS Plate Conversion"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(20)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.plate.store_path().display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Layout"),
        s.value.apply_to(format!("{}-well", config.plate.layout))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Data type"),
        s.value.apply_to(manifest.dtype)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Executor"),
        s.method.apply_to(&config.executor)
    );
    println!();

    println!("  {}", s.header.apply_to("Stitching"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Warp"),
        s.method.apply_to(config.warp)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Fuse"),
        s.method.apply_to(config.fuse)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Well shape"),
        s.value.apply_to(format_shape(&manifest.well_shape))
    );
    if config.yx_binning > 1 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Binning"),
            s.value.apply_to(config.yx_binning)
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Binning"),
            s.disabled.apply_to("none")
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Pyramid"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Chunks"),
        s.value.apply_to(format_shape(&config.run.chunks))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Levels"),
        s.value.apply_to(config.run.max_layer + 1)
    );
    let wells = match &config.run.wells {
        Some(wells) => wells.join(", "),
        None => format!("all ({})", manifest.wells.len()),
    };
    println!("    {:<12}{}", s.label.apply_to("Wells"), s.value.apply_to(wells));
    println!();
}

pub fn print_well_outputs(outputs: &[WellOutput]) {
    let s = Styles::new();
    println!();
    for output in outputs {
        println!(
            "  {} {}",
            s.header.apply_to(&output.well),
            s.path.apply_to(&output.group_path)
        );
        for level in &output.levels {
            println!(
                "    {:<6}{}",
                s.label.apply_to(&level.path),
                s.value.apply_to(format_shape(&level.shape))
            );
        }
    }
}
