//! ESRI Shapefile writer for polyline features.

use std::fs;
use std::path::Path;

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polyline, Writer};

use crate::error::{Error, Result};
use crate::geometry::GeometryCollection;

fn field(name: &str, path: &Path) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|err| Error::write(path, format!("field {}: {:?}", name, err)))
}

/// Writes `collection` to `path` (plus the `.shx` and `.dbf` sidecars) with `id` and `length`
/// attributes. A `.prj` file is added when the CRS has a known definition.
pub fn write(collection: &GeometryCollection, path: &Path) -> Result<()> {
    let table = TableWriterBuilder::new()
        .add_numeric_field(field("id", path)?, 10, 0)
        .add_numeric_field(field("length", path)?, 18, 3);
    let mut writer = Writer::from_path(path, table).map_err(|err| Error::write(path, err))?;
    for (id, line) in collection.lines().iter().enumerate() {
        let polyline = Polyline::new(line.points().iter().map(|p| Point::new(p.x, p.y)).collect());
        let mut record = Record::default();
        record.insert("id".to_string(), FieldValue::Numeric(Some(id as f64 + 1.0)));
        record.insert("length".to_string(), FieldValue::Numeric(Some(line.length())));
        writer
            .write_shape_and_record(&polyline, &record)
            .map_err(|err| Error::write(path, err))?;
    }
    drop(writer);

    if let Some(wkt) = collection.crs().and_then(|crs| crs.wkt()) {
        let prj = path.with_extension("prj");
        fs::write(&prj, wkt).map_err(|err| Error::write(&prj, err))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Crs;
    use crate::geometry::LineGeometry;

    fn line(coords: &[(f64, f64)]) -> LineGeometry {
        LineGeometry::new(
            coords.iter().map(|&(x, y)| crate::geometry::Point::new(x, y)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn writes_polylines_with_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.shp");
        let collection = GeometryCollection::new(
            vec![line(&[(0.0, 0.0), (0.0, 12.5)]), line(&[(1.0, 1.0), (4.0, 5.0), (4.0, 6.0)])],
            Some(Crs::from_epsg(32633)),
        );
        write(&collection, &path).unwrap();
        assert!(dir.path().join("lines.shx").exists());
        assert!(dir.path().join("lines.dbf").exists());
        assert!(dir.path().join("lines.prj").exists());

        let features = shapefile::read_as::<_, Polyline, Record>(&path).unwrap();
        assert_eq!(features.len(), 2);
        let (shape, record) = &features[1];
        let vertices: Vec<(f64, f64)> = shape.parts()[0].iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(vertices, vec![(1.0, 1.0), (4.0, 5.0), (4.0, 6.0)]);
        assert_eq!(record.get("id"), Some(&FieldValue::Numeric(Some(2.0))));
        assert_eq!(record.get("length"), Some(&FieldValue::Numeric(Some(6.0))));
    }

    #[test]
    fn no_prj_without_crs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.shp");
        let collection = GeometryCollection::new(vec![line(&[(0.0, 0.0), (3.0, 0.0)])], None);
        write(&collection, &path).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("lines.prj").exists());
    }
}
