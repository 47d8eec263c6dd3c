//! Georeference metadata: coordinate reference systems and affine pixel transforms.

use std::fmt;

/// A coordinate reference system identified by its EPSG code.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// Wraps an EPSG code. The code is not checked against the definition table.
    pub fn from_epsg(epsg: u16) -> Crs {
        Crs { epsg }
    }

    /// The EPSG code.
    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    /// PROJ.4 definition, if the code is known.
    pub fn proj4(&self) -> Option<&'static str> {
        crs_definitions::from_code(self.epsg).map(|def| def.proj4)
    }

    /// Well-known-text definition, if the code is known.
    pub fn wkt(&self) -> Option<&'static str> {
        crs_definitions::from_code(self.epsg).map(|def| def.wkt)
    }

    /// Whether the system uses linear or angular units. `None` for unknown codes.
    pub fn units(&self) -> Option<Units> {
        self.proj4().map(|proj4| {
            let geographic = proj4
                .split_whitespace()
                .any(|param| param == "+proj=longlat" || param == "+proj=latlong");
            if geographic {
                Units::Angular
            } else {
                Units::Linear
            }
        })
    }

    /// Shorthand for angular units; unknown codes are not geographic.
    pub fn is_geographic(&self) -> bool {
        self.units() == Some(Units::Angular)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Unit family of a coordinate reference system.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Units {
    /// Metres, feet and other projected units.
    Linear,
    /// Degrees.
    Angular,
}

/// Affine pixel-to-world transform in the usual raster convention:
///
/// ```text
/// world_x = c + col * a + row * b
/// world_y = f + col * d + row * e
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AffineTransform {
    /// Pixel width: x change per column.
    pub a: f64,
    /// Row rotation: x change per row.
    pub b: f64,
    /// x of the upper-left corner.
    pub c: f64,
    /// Column rotation: y change per column.
    pub d: f64,
    /// Pixel height: y change per row, negative for north-up rasters.
    pub e: f64,
    /// y of the upper-left corner.
    pub f: f64,
}

impl AffineTransform {
    /// Builds a transform from its six coefficients in `a..f` order.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> AffineTransform {
        AffineTransform { a, b, c, d, e, f }
    }

    /// A north-up transform with square pixels and the given upper-left corner.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size: f64) -> AffineTransform {
        AffineTransform::new(pixel_size, 0.0, origin_x, 0.0, -pixel_size, origin_y)
    }

    /// Full affine mapping including the rotation terms.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.c + col * self.a + row * self.b,
            self.f + col * self.d + row * self.e,
        )
    }

    /// Whether either rotation term is non-zero.
    pub fn is_rotated(&self) -> bool {
        self.b != 0.0 || self.d != 0.0
    }
}

/// Transform and CRS of a georeferenced raster. Either both are known or there is no context.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoContext {
    /// Maps pixel corners to world coordinates.
    pub transform: AffineTransform,
    /// The system the transform's world coordinates are in.
    pub crs: Crs,
}

impl GeoContext {
    /// Pairs a transform with its CRS.
    pub fn new(transform: AffineTransform, crs: Crs) -> GeoContext {
        GeoContext { transform, crs }
    }

    /// Combines optional parts read from file metadata; partial georeference is no georeference.
    pub fn from_parts(transform: Option<AffineTransform>, crs: Option<Crs>) -> Option<GeoContext> {
        match (transform, crs) {
            (Some(transform), Some(crs)) => Some(GeoContext { transform, crs }),
            _ => None,
        }
    }
}
