//! File discovery: recursive directory scan with loose filename matching.
//!
//! A file is selected when its lowercased filename *contains* the target
//! substring. This is a naming heuristic, not a format check: `scan.dcm.bak`
//! is picked up as DICOM and `liver_notes.txt` as a liver mask.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::LoadOptions;

/// Substring that marks a DICOM file.
pub const DICOM_MARKER: &str = ".dcm";

/// Find DICOM files below `dir`, sorted by full path.
pub fn dicom_list(dir: &Path) -> Vec<PathBuf> {
    find_files(dir, DICOM_MARKER, &LoadOptions::default())
}

/// Find mask files for `region` below `dir`, sorted by full path.
pub fn mask_list(dir: &Path, region: &str) -> Vec<PathBuf> {
    find_files(dir, region, &LoadOptions::default())
}

/// Recursively collect files whose lowercased name contains `needle` (also lowercased).
///
/// Paths are returned in full, subdirectories included, and sorted ascending by
/// their string value. Unreadable entries are logged and skipped; a directory
/// with no matches yields an empty list. Symlinked directories are only descended
/// into when `options.follow_links` is set, and are never matched themselves.
pub fn find_files(dir: &Path, needle: &str, options: &LoadOptions) -> Vec<PathBuf> {
    let needle = needle.to_lowercase();
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(options.follow_links)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry under {:?}: {}", dir, e);
                None
            }
        })
        .filter(|entry| !is_directory(entry))
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .contains(&needle)
        })
        .map(DirEntry::into_path)
        .collect();

    sort_manifest(&mut paths);

    log::debug!(
        "Scanned {:?} for {:?}: {} matching files",
        dir,
        needle,
        paths.len()
    );
    paths
}

/// A directory, or a symlink that resolves to one.
fn is_directory(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir())
}

/// Sort paths by their string value rather than component-wise.
fn sort_manifest(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_is_by_string_not_components() {
        // Component-wise, "a" < "a-b"; as strings, '-' sorts before '/'.
        let mut paths = vec![PathBuf::from("a/b.dcm"), PathBuf::from("a-b/c.dcm")];
        sort_manifest(&mut paths);
        assert_eq!(
            paths,
            vec![PathBuf::from("a-b/c.dcm"), PathBuf::from("a/b.dcm")]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert!(dicom_list(&missing).is_empty());
    }
}
