//! Removal of short artifacts from traced geometries.

use tracing::{debug, info};

use crate::error::Result;
use crate::geo::{Crs, Units};
use crate::geometry::GeometryCollection;
use crate::reproject::reproject;

/// Drops lines shorter than `min_length`, optionally after reprojecting into `reproject_to`.
///
/// Lengths are only comparable in linear units, so a collection whose CRS is missing,
/// geographic or unknown is returned as is.
pub fn filter(
    collection: GeometryCollection,
    min_length: f64,
    reproject_to: Option<Crs>,
) -> Result<GeometryCollection> {
    let collection = match reproject_to {
        Some(target) => reproject(collection, target)?,
        None => collection,
    };
    match collection.crs().map(|crs| (crs, crs.units())) {
        Some((_, Some(Units::Linear))) => {}
        Some((crs, Some(Units::Angular))) => {
            debug!(%crs, "geographic CRS, skipping length filter");
            return Ok(collection);
        }
        Some((crs, None)) => {
            debug!(%crs, "unknown CRS, skipping length filter");
            return Ok(collection);
        }
        None => {
            debug!("no CRS, skipping length filter");
            return Ok(collection);
        }
    }
    let before = collection.len();
    let kept = collection.retain(|line| line.length() >= min_length);
    info!(before, kept = kept.len(), min_length, "filtered short lines");
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LineGeometry, Point};

    fn horizontal(length: f64, y: f64) -> LineGeometry {
        LineGeometry::new(vec![Point::new(0.0, y), Point::new(length, y)]).unwrap()
    }

    fn lengths(collection: &GeometryCollection) -> Vec<f64> {
        collection.lines().iter().map(LineGeometry::length).collect()
    }

    #[test]
    fn projected_crs_removes_short_lines_in_order() {
        let input = GeometryCollection::new(
            vec![horizontal(12.0, 0.0), horizontal(4.9, 1.0), horizontal(5.0, 2.0), horizontal(7.5, 3.0)],
            Some(Crs::from_epsg(32633)),
        );
        let output = filter(input, 5.0, None).unwrap();
        assert_eq!(lengths(&output), vec![12.0, 5.0, 7.5]);
        assert_eq!(output.crs(), Some(Crs::from_epsg(32633)));
    }

    #[test]
    fn geographic_crs_passes_unchanged() {
        let input = GeometryCollection::new(
            vec![horizontal(0.001, 0.0), horizontal(0.0002, 1.0)],
            Some(Crs::from_epsg(4326)),
        );
        assert_eq!(filter(input.clone(), 5.0, None).unwrap(), input);
    }

    #[test]
    fn missing_or_unknown_crs_passes_unchanged() {
        let input = GeometryCollection::new(vec![horizontal(1.0, 0.0)], None);
        assert_eq!(filter(input.clone(), 5.0, None).unwrap(), input);

        let input = GeometryCollection::new(vec![horizontal(1.0, 0.0)], Some(Crs::from_epsg(1)));
        assert_eq!(filter(input.clone(), 5.0, None).unwrap(), input);
    }

    #[test]
    fn reprojection_happens_before_filtering() {
        // Two lines on the equator at 15E: about 111 m and 1.1 m long once in metres.
        let input = GeometryCollection::new(
            vec![
                LineGeometry::new(vec![Point::new(15.0, 0.0), Point::new(15.001, 0.0)]).unwrap(),
                LineGeometry::new(vec![Point::new(15.0, 0.0), Point::new(15.00001, 0.0)]).unwrap(),
            ],
            Some(Crs::from_epsg(4326)),
        );
        let output = filter(input, 5.0, Some(Crs::from_epsg(32633))).unwrap();
        assert_eq!(output.crs(), Some(Crs::from_epsg(32633)));
        assert_eq!(output.len(), 1);
        assert!((output.lines()[0].length() - 111.3).abs() < 1.0);
    }
}
