use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fatal failures of a pipeline run.
#[derive(Debug, Error)]
pub enum Error {
    /// The input raster is missing or could not be decoded.
    #[error("could not read image at {}", path.display())]
    Read {
        /// Input path.
        path: PathBuf,
        /// Underlying decoder or I/O failure.
        #[source]
        source: BoxError,
    },

    /// Two stages disagree about raster dimensions.
    #[error("shape mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    Shape {
        /// Dimensions of the source image.
        expected: (u32, u32),
        /// Dimensions that were produced.
        actual: (u32, u32),
    },

    /// Coordinates could not be transformed into the requested system.
    #[error("reprojection failed: {0}")]
    Reproject(String),

    /// An output file could not be written.
    #[error("could not write {}", path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying encoder or I/O failure.
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub(crate) fn read<E: Into<BoxError>>(path: impl Into<PathBuf>, source: E) -> Error {
        Error::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write<E: Into<BoxError>>(path: impl Into<PathBuf>, source: E) -> Error {
        Error::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
