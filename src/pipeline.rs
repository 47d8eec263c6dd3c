//! The end-to-end run: raster in, masks and vector lines out.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::{Error, Result};
use crate::extract::extract;
use crate::filter::filter;
use crate::geo::Crs;
use crate::raster::RasterCodec;
use crate::vector::VectorFormat;
use crate::vectorize::{vectorize, Georeference};

/// File name, without extension, of the edge mask.
pub const EDGES_STEM: &str = "terrace_edges";
/// File name, without extension, of the skeleton mask.
pub const SKELETON_STEM: &str = "terrace_skeleton";

/// Parameters of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Source raster.
    pub image: PathBuf,
    /// Directory receiving every output, created if missing.
    pub out_dir: PathBuf,
    /// Canny hysteresis threshold: gradients above it extend an edge.
    pub low_threshold: f32,
    /// Canny hysteresis threshold: gradients above it start an edge.
    pub high_threshold: f32,
    /// Side of the square Gaussian smoothing window.
    pub blur_kernel_size: usize,
    /// Lines shorter than this, in CRS units, are dropped when the CRS is projected.
    pub min_length: f64,
    /// Container of the vector output.
    pub format: VectorFormat,
    /// CRS of the fallback grid, used only when the raster carries no georeference.
    pub fallback_epsg: Option<Crs>,
    /// Side of a fallback grid cell in world units.
    pub fallback_pixel_size: f64,
    /// World coordinates of the fallback grid's upper-left corner.
    pub fallback_origin: (f64, f64),
    /// Reproject the lines before filtering.
    pub reproject_to: Option<Crs>,
}

impl Default for PipelineConfig {
    fn default() -> PipelineConfig {
        PipelineConfig {
            image: PathBuf::new(),
            out_dir: PathBuf::from("outputs"),
            low_threshold: 50.0,
            high_threshold: 150.0,
            blur_kernel_size: 3,
            min_length: 5.0,
            format: VectorFormat::default(),
            fallback_epsg: None,
            fallback_pixel_size: 0.3,
            fallback_origin: (0.0, 0.0),
            reproject_to: None,
        }
    }
}

/// Where a run put its results.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutput {
    /// The output directory as configured.
    pub out_dir: PathBuf,
    /// Edge mask written by the extraction stage.
    pub edges_path: PathBuf,
    /// Thinned mask the lines were traced from.
    pub skeleton_path: PathBuf,
    /// Main vector file; Shapefile sidecars sit next to it.
    pub vector_path: PathBuf,
    /// Number of lines in the vector file.
    pub lines: usize,
}

/// Runs the whole pipeline once, strictly in sequence. Outputs written before a failure are
/// left on disk.
pub fn run(config: &PipelineConfig, codec: &dyn RasterCodec) -> Result<PipelineOutput> {
    let raster = codec.read(&config.image)?;
    let (edges, skeleton) = extract(
        &raster.pixels,
        config.low_threshold,
        config.high_threshold,
        config.blur_kernel_size,
    )?;

    fs::create_dir_all(&config.out_dir).map_err(|err| Error::write(&config.out_dir, err))?;
    let geo = raster.geo.as_ref();
    let edges_path = codec.write_mask(&edges, geo, &config.out_dir.join(EDGES_STEM))?;
    let skeleton_path = codec.write_mask(&skeleton, geo, &config.out_dir.join(SKELETON_STEM))?;

    let georeference = match raster.geo {
        Some(geo) => Georeference::WithGeoContext(geo),
        None => {
            info!(
                pixel_size = config.fallback_pixel_size,
                epsg = ?config.fallback_epsg.map(|crs| crs.epsg()),
                "no georeference, using fallback grid"
            );
            Georeference::WithFallback {
                origin: config.fallback_origin,
                pixel_size: config.fallback_pixel_size,
                epsg: config.fallback_epsg,
            }
        }
    };
    let lines = vectorize(&skeleton, &georeference);
    let lines = filter(lines, config.min_length, config.reproject_to)?;
    let vector_path = config.format.write(&lines, &config.out_dir)?;

    Ok(PipelineOutput {
        out_dir: config.out_dir.clone(),
        edges_path,
        skeleton_path,
        vector_path,
        lines: lines.len(),
    })
}
