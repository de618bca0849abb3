//! Slice decoders for the supported series formats.
//!
//! The stacker is generic over [`SliceDecoder`]: one implementation per
//! format, each turning a single file into one 2-D `(rows, columns)` grid.
//! [`SeriesFormat`] picks the implementation once, from the first file of a
//! manifest.
//!
//! ## Adding New Formats
//!
//! 1. Implement `SliceDecoder` for the new format in its own module
//! 2. Add a `SeriesFormat` variant and route it in `stack::list_as_volume`

mod dicom;
mod mask;

use std::path::Path;

use ndarray::Array2;

pub use dicom::{DicomDecoder, DicomPixel, probe_pixel_type};
pub use mask::MaskDecoder;

use crate::error::LoadError;

/// Decodes one file into one 2-D slice.
pub trait SliceDecoder: Sync {
    /// Element type written into the volume.
    type Pixel: Copy + Default + Send + Sync;

    /// Short identifier used in log messages (e.g. "dicom", "nrrd").
    fn id(&self) -> &'static str;

    /// Decode `path` into a `(rows, columns)` grid.
    fn decode(&self, path: &Path) -> Result<Array2<Self::Pixel>, LoadError>;
}

/// Format of a series, chosen from the suffix of its first file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesFormat {
    /// One DICOM image per file
    Dicom,
    /// One NRRD label mask per file
    Nrrd,
}

impl SeriesFormat {
    /// Detect the format from a path suffix, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.to_string_lossy().to_lowercase();
        if name.ends_with(".dcm") {
            Some(SeriesFormat::Dicom)
        } else if name.ends_with(".nrrd") {
            Some(SeriesFormat::Nrrd)
        } else {
            None
        }
    }

    /// Human-readable name for log output.
    pub fn display_name(self) -> &'static str {
        match self {
            SeriesFormat::Dicom => "DICOM",
            SeriesFormat::Nrrd => "NRRD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_suffix() {
        assert_eq!(
            SeriesFormat::from_path(Path::new("/data/a.dcm")),
            Some(SeriesFormat::Dicom)
        );
        assert_eq!(
            SeriesFormat::from_path(Path::new("/data/A.DCM")),
            Some(SeriesFormat::Dicom)
        );
        assert_eq!(
            SeriesFormat::from_path(Path::new("/data/liver_01.nrrd")),
            Some(SeriesFormat::Nrrd)
        );
        assert_eq!(SeriesFormat::from_path(Path::new("/data/a.png")), None);
        // Matched by discovery, but not a recognised suffix
        assert_eq!(
            SeriesFormat::from_path(Path::new("/data/liver_backup.dcm.bak")),
            None
        );
    }
}
