//! medvol - stack DICOM series and NRRD label masks into 4-D arrays
//!
//! Walks a directory, picks files by filename, and stacks them in sorted path
//! order into a single `(slices, rows, columns, 1)` [`ndarray`] volume.
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! let images = medvol::load_dicom(Path::new("/data/patientA"))?;
//! let masks = medvol::load_masks(Path::new("/data/patientA/masks"), "liver")?;
//! assert_eq!(images.shape()[1..], masks.shape()[1..]);
//! ```

pub mod config;
pub mod decode;
pub mod discovery;
mod error;
mod load;
pub mod nrrd;
pub mod stack;
mod volume;

pub use config::{LoadOptions, LogLevel};
pub use discovery::{dicom_list, find_files, mask_list};
pub use error::{DecodeError, LoadError};
pub use load::{load_dicom, load_dicom_with, load_masks, load_masks_with};
pub use stack::list_as_volume;
pub use volume::{PixelType, Volume};

#[cfg(test)]
mod tests;
