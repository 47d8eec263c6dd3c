//! Coordinate transformation between EPSG systems.

use proj4rs::Proj;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geo::Crs;
use crate::geometry::{GeometryCollection, Point};

struct Endpoint {
    proj: Proj,
    geographic: bool,
}

impl Endpoint {
    fn new(crs: Crs) -> Result<Endpoint> {
        let definition = crs
            .proj4()
            .ok_or_else(|| Error::Reproject(format!("no definition for {}", crs)))?;
        let proj = Proj::from_proj_string(definition)
            .map_err(|err| Error::Reproject(format!("{}: {}", crs, err)))?;
        Ok(Endpoint {
            proj,
            geographic: crs.is_geographic(),
        })
    }
}

fn transform_point(from: &Endpoint, to: &Endpoint, p: Point) -> Result<Point> {
    let mut xyz = if from.geographic {
        (p.x.to_radians(), p.y.to_radians(), 0.0)
    } else {
        (p.x, p.y, 0.0)
    };
    proj4rs::transform::transform(&from.proj, &to.proj, &mut xyz)
        .map_err(|err| Error::Reproject(format!("({}, {}): {}", p.x, p.y, err)))?;
    Ok(if to.geographic {
        Point::new(xyz.0.to_degrees(), xyz.1.to_degrees())
    } else {
        Point::new(xyz.0, xyz.1)
    })
}

/// Transforms every vertex of `collection` into `target`.
///
/// Fails when the collection has no CRS or either system has no known definition. Lines that
/// end up with non-finite coordinates are dropped.
pub fn reproject(collection: GeometryCollection, target: Crs) -> Result<GeometryCollection> {
    let source = collection
        .crs()
        .ok_or_else(|| Error::Reproject(format!("cannot reproject to {} without a source CRS", target)))?;
    if source == target {
        return Ok(collection);
    }
    let from = Endpoint::new(source)?;
    let to = Endpoint::new(target)?;
    let mut lines = Vec::with_capacity(collection.len());
    for line in collection.lines() {
        match line.try_map(|p| transform_point(&from, &to, p))? {
            Ok(line) => lines.push(line),
            Err(err) => debug!("dropping reprojected line: {}", err),
        }
    }
    info!(%source, %target, lines = lines.len(), "reprojected geometries");
    Ok(GeometryCollection::new(lines, Some(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LineGeometry;

    fn collection(coords: &[(f64, f64)], crs: Option<Crs>) -> GeometryCollection {
        let line = LineGeometry::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap();
        GeometryCollection::new(vec![line], crs)
    }

    #[test]
    fn wgs84_to_utm_central_meridian() {
        let input = collection(&[(15.0, 0.0), (15.0, 45.0)], Some(Crs::from_epsg(4326)));
        let output = reproject(input, Crs::from_epsg(32633)).unwrap();
        assert_eq!(output.crs(), Some(Crs::from_epsg(32633)));
        let points = output.lines()[0].points();
        assert!((points[0].x - 500000.0).abs() < 0.01, "{:?}", points[0]);
        assert!(points[0].y.abs() < 0.01, "{:?}", points[0]);
        assert!((points[1].x - 500000.0).abs() < 0.01, "{:?}", points[1]);
        assert!((points[1].y - 4982950.4).abs() < 1.0, "{:?}", points[1]);
    }

    #[test]
    fn utm_back_to_wgs84() {
        let input = collection(&[(500000.0, 0.0), (500000.0, 1000.0)], Some(Crs::from_epsg(32633)));
        let output = reproject(input, Crs::from_epsg(4326)).unwrap();
        let first = output.lines()[0].points()[0];
        assert!((first.x - 15.0).abs() < 1e-6, "{:?}", first);
        assert!(first.y.abs() < 1e-6, "{:?}", first);
    }

    #[test]
    fn same_crs_is_a_no_op() {
        let input = collection(&[(1.0, 2.0), (3.0, 4.0)], Some(Crs::from_epsg(32633)));
        assert_eq!(reproject(input.clone(), Crs::from_epsg(32633)).unwrap(), input);
    }

    #[test]
    fn missing_source_crs_fails() {
        let input = collection(&[(1.0, 2.0), (3.0, 4.0)], None);
        assert!(matches!(reproject(input, Crs::from_epsg(4326)), Err(Error::Reproject(_))));
    }

    #[test]
    fn unknown_target_fails() {
        let input = collection(&[(1.0, 2.0), (3.0, 4.0)], Some(Crs::from_epsg(32633)));
        assert!(matches!(reproject(input, Crs::from_epsg(1)), Err(Error::Reproject(_))));
    }
}
