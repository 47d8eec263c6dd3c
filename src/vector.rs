//! Persisting traced lines.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::geometry::GeometryCollection;
use crate::{gpkg, shp};

/// File name, without extension, of the vector output.
pub const LINES_STEM: &str = "terrace_lines";

/// Vector container written by the pipeline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum VectorFormat {
    /// `terrace_lines.gpkg`
    GeoPackage,
    /// `terrace_lines.shp` with `.shx`, `.dbf` and `.prj` sidecars.
    #[default]
    Shapefile,
}

impl VectorFormat {
    /// File extension of the main output file.
    pub fn extension(&self) -> &'static str {
        match self {
            VectorFormat::GeoPackage => "gpkg",
            VectorFormat::Shapefile => "shp",
        }
    }

    /// Writes `collection` into `out_dir` and returns the path of the main file.
    pub fn write(&self, collection: &GeometryCollection, out_dir: &Path) -> Result<PathBuf> {
        let path = out_dir.join(LINES_STEM).with_extension(self.extension());
        match self {
            VectorFormat::GeoPackage => gpkg::write(collection, &path)?,
            VectorFormat::Shapefile => shp::write(collection, &path)?,
        }
        info!(path = %path.display(), lines = collection.len(), "wrote vectors");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapefile_is_the_default() {
        assert_eq!(VectorFormat::default(), VectorFormat::Shapefile);
    }

    #[test]
    fn output_names() {
        let dir = tempfile::tempdir().unwrap();
        let gpkg = VectorFormat::GeoPackage
            .write(&GeometryCollection::default(), dir.path())
            .unwrap();
        assert_eq!(gpkg, dir.path().join("terrace_lines.gpkg"));
        assert!(gpkg.exists());
    }
}
