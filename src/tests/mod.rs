//! Scenario tests against real files on disk.
//!
//! Fixtures are written into temporary directories: DICOM files through
//! `dicom-object`, NRRD masks through a minimal header writer.

mod fixtures;
mod mask_tests;
