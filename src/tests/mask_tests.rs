//! End-to-end tests for NRRD mask loading.

use super::fixtures::write_mask_u16;
use crate::config::LoadOptions;
use crate::error::{DecodeError, LoadError};
use crate::load::{load_masks, load_masks_with};
use crate::nrrd::NrrdError;
use crate::volume::PixelType;

#[test]
fn test_two_liver_masks() {
    let dir = tempfile::tempdir().unwrap();
    let masks = dir.path().join("masks");
    write_mask_u16(&masks.join("liver_02.nrrd"), &[256, 256], |_, _| 2);
    write_mask_u16(&masks.join("liver_01.nrrd"), &[256, 256], |x, y| {
        u16::from(x == 10 && y == 200)
    });
    write_mask_u16(&masks.join("kidney_01.nrrd"), &[64, 64], |_, _| 9);

    let volume = load_masks(&masks, "liver").unwrap();

    assert_eq!(volume.shape(), [2, 256, 256, 1]);
    assert_eq!(volume.pixel_type(), PixelType::Float64);

    let array = volume.as_f64().unwrap();
    // liver_01 first; its marked voxel (x=10, y=200) lands at row 200, column 10
    assert_eq!(array[[0, 200, 10, 0]], 1.0);
    assert_eq!(array[[0, 10, 200, 0]], 0.0);
    assert_eq!(array.index_axis(ndarray::Axis(0), 0).sum(), 1.0);
    assert!(array.index_axis(ndarray::Axis(0), 1).iter().all(|&v| v == 2.0));
}

#[test]
fn test_non_square_mask_is_transposed() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    for name in ["spleen_a.nrrd", "spleen_b.nrrd"] {
        write_mask_u16(&root.join(name), &[5, 3], |x, y| (x + 10 * y) as u16);
    }

    let volume = load_masks_with(root, "SPLEEN", &LoadOptions::sequential()).unwrap();

    // sizes (x=5, y=3) become (rows=3, columns=5)
    assert_eq!(volume.shape(), [2, 3, 5, 1]);
    let array = volume.as_f64().unwrap();
    assert_eq!(array[[1, 2, 4, 0]], 24.0);
    assert_eq!(array[[1, 1, 0, 0]], 10.0);
}

#[test]
fn test_three_dimensional_mask_uses_first_plane() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_mask_u16(&root.join("heart.nrrd"), &[4, 4, 1], |x, y| (x * y) as u16);

    let volume = load_masks(root, "heart").unwrap();

    assert_eq!(volume.shape(), [1, 4, 4, 1]);
    assert_eq!(volume.as_f64().unwrap()[[0, 3, 2, 0]], 6.0);
}

#[test]
fn test_region_without_masks() {
    let dir = tempfile::tempdir().unwrap();
    write_mask_u16(&dir.path().join("liver_01.nrrd"), &[2, 2], |_, _| 1);

    assert!(matches!(
        load_masks(dir.path(), "pancreas"),
        Err(LoadError::EmptyInput)
    ));
}

#[test]
fn test_truncated_mask_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_mask_u16(&root.join("lung_1.nrrd"), &[4, 4], |_, _| 1);
    std::fs::write(
        root.join("lung_2.nrrd"),
        b"NRRD0004\ntype: uint8\ndimension: 2\nsizes: 4 4\nencoding: raw\n\n\x01\x02",
    )
    .unwrap();

    match load_masks(root, "lung") {
        Err(LoadError::Decode { path, source }) => {
            assert_eq!(path, root.join("lung_2.nrrd"));
            assert!(matches!(
                source,
                DecodeError::Nrrd(NrrdError::Truncated {
                    expected: 16,
                    found: 2
                })
            ));
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
}

#[test]
fn test_overflowing_sizes_name_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(
        root.join("bone.nrrd"),
        b"NRRD0004\ntype: uint8\ndimension: 2\nsizes: 18446744073709551615 2\nencoding: raw\n\n\x01\x02",
    )
    .unwrap();

    match load_masks(root, "bone") {
        Err(LoadError::Decode { path, source }) => {
            assert_eq!(path, root.join("bone.nrrd"));
            assert!(matches!(
                source,
                DecodeError::Nrrd(NrrdError::InvalidField { .. })
            ));
        }
        other => panic!("expected decode failure, got {other:?}"),
    }
}
