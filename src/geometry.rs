//! World-space line geometry.

use thiserror::Error;

use crate::geo::Crs;

/// A point in world coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    /// Easting or longitude.
    pub x: f64,
    /// Northing or latitude.
    pub y: f64,
}

impl Point {
    /// A point at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    /// Planar distance; meaningless for geographic coordinates.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Reasons a traced path cannot become a line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The path has fewer than two vertices.
    #[error("a line needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    /// The vertex at this index has a NaN or infinite coordinate.
    #[error("vertex {0} has a non-finite coordinate")]
    NonFinite(usize),
}

/// An ordered path of at least two finite points.
#[derive(Clone, Debug, PartialEq)]
pub struct LineGeometry {
    points: Vec<Point>,
}

impl LineGeometry {
    /// Validates `points` into a line.
    pub fn new(points: Vec<Point>) -> Result<LineGeometry, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints(points.len()));
        }
        if let Some(i) = points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(GeometryError::NonFinite(i));
        }
        Ok(LineGeometry { points })
    }

    /// The vertices in path order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of vertices, at least 2.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Sum of the distances between consecutive vertices.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`.
    pub fn envelope(&self) -> (f64, f64, f64, f64) {
        self.points.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), p| {
                (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
            },
        )
    }

    /// Applies `f` to every vertex, revalidating the result.
    pub fn try_map<F, E>(&self, mut f: F) -> Result<Result<LineGeometry, GeometryError>, E>
    where
        F: FnMut(Point) -> Result<Point, E>,
    {
        let points = self
            .points
            .iter()
            .map(|&p| f(p))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(LineGeometry::new(points))
    }
}

/// Ordered lines sharing one (optional) coordinate reference system.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryCollection {
    lines: Vec<LineGeometry>,
    crs: Option<Crs>,
}

impl GeometryCollection {
    /// Wraps `lines`, keeping their order.
    pub fn new(lines: Vec<LineGeometry>, crs: Option<Crs>) -> GeometryCollection {
        GeometryCollection { lines, crs }
    }

    /// The lines in trace order.
    pub fn lines(&self) -> &[LineGeometry] {
        &self.lines
    }

    /// Unwraps the lines, dropping the CRS.
    pub fn into_lines(self) -> Vec<LineGeometry> {
        self.lines
    }

    /// The CRS of every line, `None` when the coordinates are bare pixels or unknown.
    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether there are no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Envelope of all lines, `None` for an empty collection.
    pub fn envelope(&self) -> Option<(f64, f64, f64, f64)> {
        self.lines.iter().map(LineGeometry::envelope).reduce(|a, b| {
            (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))
        })
    }

    /// Keeps the lines matching `keep`, preserving their order.
    pub fn retain<F: FnMut(&LineGeometry) -> bool>(mut self, keep: F) -> GeometryCollection {
        self.lines.retain(keep);
        self
    }
}
