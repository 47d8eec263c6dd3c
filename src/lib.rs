#![cfg_attr(all(test, feature = "unstable"), feature(test))]
#![warn(missing_docs)]

//! Extraction of terrace boundary lines from (geo)raster imagery.
//!
//! A run reads an image, finds its edges with the Canny algorithm, thins them to a one pixel
//! wide skeleton, traces the skeleton into polylines in world coordinates and drops short
//! artifacts before writing a GeoPackage or Shapefile.
//!
//! # Running the pipeline
//!
//! ```no_run
//! use terrace_lines::{run, Crs, GeoTiffCodec, PipelineConfig, VectorFormat};
//!
//! let config = PipelineConfig {
//!     image: "orthophoto.tif".into(),
//!     out_dir: "outputs".into(),
//!     format: VectorFormat::GeoPackage,
//!     fallback_epsg: Some(Crs::from_epsg(32633)),
//!     ..PipelineConfig::default()
//! };
//! let output = run(&config, &GeoTiffCodec).expect("pipeline failed");
//! println!("{} lines in {}", output.lines, output.vector_path.display());
//! ```
//!
//! The stages are public on their own as well: see `extract`, `vectorize` and `filter`.

mod edge;
mod error;
mod extract;
mod filter;
mod geo;
mod geometry;
mod gpkg;
mod mask;
mod pipeline;
mod raster;
mod reproject;
mod shp;
mod skeleton;
mod trace;
mod vector;
mod vectorize;

pub use edge::{canny, Channel};
pub use error::{Error, Result};
pub use extract::{extract, intensity};
pub use filter::filter;
pub use geo::{AffineTransform, Crs, GeoContext, Units};
pub use geometry::{GeometryCollection, GeometryError, LineGeometry, Point};
pub use mask::{BinaryMask, FOREGROUND};
pub use pipeline::{run, PipelineConfig, PipelineOutput, EDGES_STEM, SKELETON_STEM};
pub use raster::{GeoTiffCodec, RasterCodec, RasterImage};
pub use reproject::reproject;
pub use skeleton::thin;
pub use trace::{trace, PixelChain};
pub use vector::{VectorFormat, LINES_STEM};
pub use vectorize::{vectorize, Georeference};
