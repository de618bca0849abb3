//! Error types for discovery, decoding, and stacking.

use std::path::PathBuf;
use thiserror::Error;

use crate::nrrd::NrrdError;
use crate::volume::PixelType;

/// Errors that can occur while building a volume from a file manifest.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The manifest holds no files, so there is nothing to size the volume from.
    #[error("no input files to load")]
    EmptyInput,

    /// The first file's suffix matches none of the known series formats.
    #[error("unsupported file format: {path:?} (expected a .dcm or .nrrd file)")]
    UnsupportedFormat {
        /// The path whose suffix was inspected
        path: PathBuf,
    },

    /// A single file could not be decoded.
    #[error("failed to decode {path:?}: {source}")]
    Decode {
        /// The offending file
        path: PathBuf,
        /// What went wrong inside the decoder
        #[source]
        source: DecodeError,
    },

    /// A decoded slice does not fit the grid sized from the first file.
    #[error("slice {path:?} has shape {found:?}, expected {expected:?}")]
    SliceShapeMismatch {
        /// The offending file
        path: PathBuf,
        /// (rows, columns) taken from the first file
        expected: (usize, usize),
        /// (rows, columns) of this file
        found: (usize, usize),
    },

    /// The dedicated decode thread pool could not be started.
    #[error("failed to build decode thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl LoadError {
    /// Attach a path to a decoder error.
    pub fn decode(path: impl Into<PathBuf>, source: impl Into<DecodeError>) -> Self {
        Self::Decode {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Errors raised by an individual slice decoder.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The DICOM file could not be opened or parsed
    #[error("cannot read DICOM file: {0}")]
    DicomOpen(String),

    /// A required DICOM attribute is missing or malformed
    #[error("DICOM attribute {attribute}: {message}")]
    DicomAttribute {
        /// Keyword of the attribute
        attribute: &'static str,
        /// Description of the failure
        message: String,
    },

    /// Pixel data could not be decoded
    #[error("cannot decode pixel data: {0}")]
    PixelData(String),

    /// The file holds something other than one 2-D single-sample grid
    #[error("unsupported pixel layout: {0}")]
    UnsupportedPixelLayout(String),

    /// The file's native pixel type differs from the series pixel type
    #[error("pixel type {found} does not match series pixel type {expected}")]
    PixelTypeMismatch {
        /// Pixel type of the first file in the series
        expected: PixelType,
        /// Pixel type of this file
        found: PixelType,
    },

    /// NRRD parsing or payload error
    #[error(transparent)]
    Nrrd(#[from] NrrdError),
}
