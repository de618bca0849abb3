//! Top-level loaders: discover a series in a directory and stack it.

use std::path::Path;

use crate::config::LoadOptions;
use crate::discovery::{DICOM_MARKER, find_files};
use crate::error::LoadError;
use crate::stack::list_as_volume;
use crate::volume::Volume;

/// Load every DICOM image below `dir` into a `(N, rows, columns, 1)` volume.
pub fn load_dicom(dir: &Path) -> Result<Volume, LoadError> {
    load_dicom_with(dir, &LoadOptions::default())
}

/// [`load_dicom`] with explicit options.
pub fn load_dicom_with(dir: &Path, options: &LoadOptions) -> Result<Volume, LoadError> {
    let paths = find_files(dir, DICOM_MARKER, options);
    let volume = list_as_volume(&paths, options)?;
    log::info!("{} DICOM images loaded.", paths.len());
    Ok(volume)
}

/// Load every `.nrrd` mask for `region` below `dir` as a `float64` volume.
pub fn load_masks(dir: &Path, region: &str) -> Result<Volume, LoadError> {
    load_masks_with(dir, region, &LoadOptions::default())
}

/// [`load_masks`] with explicit options.
pub fn load_masks_with(
    dir: &Path,
    region: &str,
    options: &LoadOptions,
) -> Result<Volume, LoadError> {
    let paths = find_files(dir, region, options);
    let volume = list_as_volume(&paths, options)?;
    log::info!("{} .nrrd masks from {} loaded.", paths.len(), region);
    Ok(volume)
}
