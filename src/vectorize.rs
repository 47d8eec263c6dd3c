//! Conversion of a skeleton mask into world-space line geometry.

use tracing::{debug, info};

use crate::geo::{Crs, GeoContext};
use crate::geometry::{GeometryCollection, LineGeometry, Point};
use crate::mask::BinaryMask;
use crate::trace::trace;

/// How pixel coordinates become world coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Georeference {
    /// The raster carried its own transform and CRS.
    ///
    /// Only the scale and offset terms are applied per vertex: `x = c + col * a`,
    /// `y = f + row * e`.
    WithGeoContext(GeoContext),
    /// No metadata: a north-up grid of square pixels anchored at `origin`, rows growing
    /// southward, optionally tagged with an EPSG code.
    WithFallback {
        /// World coordinates of the upper-left pixel corner.
        origin: (f64, f64),
        /// Side of a pixel in world units.
        pixel_size: f64,
        /// CRS to tag the lines with, if known.
        epsg: Option<Crs>,
    },
}

impl Georeference {
    /// World position of the pixel corner at `(col, row)`.
    pub fn to_world(&self, col: u32, row: u32) -> Point {
        let (col, row) = (col as f64, row as f64);
        match *self {
            Georeference::WithGeoContext(GeoContext { transform: t, .. }) => {
                Point::new(t.c + col * t.a, t.f + row * t.e)
            }
            Georeference::WithFallback {
                origin: (x0, y0),
                pixel_size,
                ..
            } => Point::new(x0 + col * pixel_size, y0 - row * pixel_size),
        }
    }

    /// CRS the produced geometries are expressed in.
    pub fn crs(&self) -> Option<Crs> {
        match *self {
            Georeference::WithGeoContext(geo) => Some(geo.crs),
            Georeference::WithFallback { epsg, .. } => epsg,
        }
    }
}

/// Traces `skeleton` and maps every chain into world space.
///
/// Chains that cannot form a line (a single isolated pixel) are dropped.
pub fn vectorize(skeleton: &BinaryMask, georeference: &Georeference) -> GeometryCollection {
    let chains = trace(skeleton);
    let traced = chains.len();
    let lines: Vec<LineGeometry> = chains
        .into_iter()
        .filter(|chain| chain.len() >= 2)
        .filter_map(|chain| {
            let points = chain
                .iter()
                .map(|&(col, row)| georeference.to_world(col, row))
                .collect();
            match LineGeometry::new(points) {
                Ok(line) => Some(line),
                Err(err) => {
                    debug!(start = ?chain[0], "dropping traced chain: {}", err);
                    None
                }
            }
        })
        .collect();
    info!(traced, lines = lines.len(), "vectorized skeleton");
    GeometryCollection::new(lines, georeference.crs())
}
