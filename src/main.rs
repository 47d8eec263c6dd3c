//! terrace-lines CLI: extract terrace boundary lines from a raster.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use terrace_lines::{run, Crs, GeoTiffCodec, PipelineConfig, VectorFormat};

#[derive(Parser)]
#[command(name = "terrace-lines")]
#[command(about = "Extract terrace boundary lines from (geo)raster imagery")]
#[command(version)]
struct Cli {
    /// Input raster: GeoTIFF or any common image format.
    #[arg(long)]
    image: PathBuf,

    /// Output directory, created if missing.
    #[arg(long)]
    out: PathBuf,

    /// Canny low threshold.
    #[arg(long, default_value_t = 50.0)]
    t1: f32,

    /// Canny high threshold.
    #[arg(long, default_value_t = 150.0)]
    t2: f32,

    /// Gaussian blur kernel size.
    #[arg(long, default_value_t = 3)]
    kernel: usize,

    /// Minimum line length in metres (projected CRS only).
    #[arg(long, default_value_t = 5.0)]
    min_length: f64,

    /// Write a GeoPackage instead of a Shapefile.
    #[arg(long)]
    as_gpkg: bool,

    /// EPSG code of the fallback grid when the image has no georeference.
    #[arg(long)]
    epsg: Option<u16>,

    /// Pixel size of the fallback grid.
    #[arg(long, default_value_t = 0.3)]
    pixel_size: f64,

    /// Upper left x of the fallback grid.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    origin_x: f64,

    /// Upper left y of the fallback grid.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    origin_y: f64,

    /// Reproject the lines to this EPSG code before length filtering.
    #[arg(long)]
    project_epsg: Option<u16>,
}

impl From<Cli> for PipelineConfig {
    fn from(cli: Cli) -> PipelineConfig {
        PipelineConfig {
            image: cli.image,
            out_dir: cli.out,
            low_threshold: cli.t1,
            high_threshold: cli.t2,
            blur_kernel_size: cli.kernel,
            min_length: cli.min_length,
            format: if cli.as_gpkg {
                VectorFormat::GeoPackage
            } else {
                VectorFormat::Shapefile
            },
            fallback_epsg: cli.epsg.map(Crs::from_epsg),
            fallback_pixel_size: cli.pixel_size,
            fallback_origin: (cli.origin_x, cli.origin_y),
            reproject_to: cli.project_epsg.map(Crs::from_epsg),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from(Cli::parse());
    let output = run(&config, &GeoTiffCodec)
        .with_context(|| format!("failed to extract terraces from {}", config.image.display()))?;

    println!("Outputs written to: {}", output.out_dir.display());
    println!("Vector file: {}", output.vector_path.display());
    Ok(())
}
