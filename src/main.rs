use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use blobtrace::{
    BlobSet, BlobSummary, Calibration, DrawOptions, FilterPipeline, FilterStep, Polarity,
    TracerConfig,
};

#[derive(Parser)]
#[command(name = "blobtrace")]
#[command(about = "Label connected components in a binary image and measure their shape")]
struct Cli {
    /// Path to an 8-bit grayscale input image
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Objects are white on a black background
    #[arg(long)]
    black_background: bool,

    /// Trace every gray level above the minimum as its own mask
    #[arg(long)]
    multilevel: bool,

    /// Keep blobs whose feature lies in a range (repeatable, applied in order)
    #[arg(long = "filter", value_name = "NAME:LOWER[:UPPER]")]
    filters: Vec<FilterStep>,

    /// Print the blob summaries as JSON
    #[arg(long)]
    json: bool,

    /// Save the colorized label image
    #[arg(long, value_name = "PNG")]
    labels_out: Option<PathBuf>,

    /// Save the input with the blobs and their convex hulls drawn over it
    #[arg(long, value_name = "PNG")]
    overlay_out: Option<PathBuf>,

    /// Physical width of one pixel
    #[arg(long, default_value_t = 1.0)]
    pixel_width: f64,

    /// Physical height of one pixel
    #[arg(long, default_value_t = 1.0)]
    pixel_height: f64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let raster = blobtrace::raster::load(&args.image_path)
        .with_context(|| format!("Failed to load {}", args.image_path.display()))?
        .with_calibration(Calibration::new(args.pixel_width, args.pixel_height));
    info!(
        width = raster.image().width(),
        height = raster.image().height(),
        "image loaded"
    );

    let polarity = if args.black_background {
        Polarity::BlackBackground
    } else {
        Polarity::WhiteBackground
    };
    let mut blobs = BlobSet::new(&raster).with_config(
        TracerConfig::new()
            .with_polarity(polarity)
            .with_multilevel(args.multilevel),
    );
    blobs
        .find_connected_components()
        .context("Failed to trace connected components")?;

    let pipeline = args
        .filters
        .iter()
        .cloned()
        .fold(FilterPipeline::new().with_verbose(args.verbose), FilterPipeline::add_step);
    let blobs = pipeline.run(&blobs).context("Failed to filter blobs")?;

    let summaries: Vec<BlobSummary> = blobs.iter().map(|b| b.summary()).collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        println!("=== Blobs ===");
        println!("Total: {}", summaries.len());
        for s in &summaries {
            println!(
                "  #{:<4} area={:<10.2} perimeter={:<9.2} circularity={:<7.3} holes={} edge={}",
                s.label, s.enclosed_area, s.perimeter, s.circularity, s.holes, s.on_edge
            );
        }
    }

    if let Some(path) = &args.labels_out {
        blobs
            .labeled_rgb()?
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to save label image: {}", e))?;
        info!(path = %path.display(), "label image saved");
    }

    if let Some(path) = &args.overlay_out {
        let options = DrawOptions {
            convex_hull: true,
            ..DrawOptions::default()
        };
        blobs
            .overlay(&options)?
            .save(path)
            .map_err(|e| anyhow::anyhow!("Failed to save overlay: {}", e))?;
        info!(path = %path.display(), "overlay saved");
    }

    Ok(())
}
