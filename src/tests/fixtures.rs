//! Helpers that write small DICOM and NRRD files for tests.

use std::path::Path;

use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::tags;
use dicom_object::mem::InMemElement;
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};

const EXPLICIT_VR_LITTLE_ENDIAN: &str = "1.2.840.10008.1.2.1";
const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";

/// Create an empty file, making parent directories as needed.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"").unwrap();
}

/// Write a single-frame monochrome DICOM file with 16-bit unsigned pixels.
///
/// `pixel(row, column)` gives the stored value.
pub fn write_dicom_u16(path: &Path, rows: u16, columns: u16, pixel: impl Fn(usize, usize) -> u16) {
    let values: Vec<u16> = (0..usize::from(rows))
        .flat_map(|r| (0..usize::from(columns)).map(move |c| (r, c)))
        .map(|(r, c)| pixel(r, c))
        .collect();

    write_dicom(
        path,
        rows,
        columns,
        16,
        DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16(values.into_iter().collect()),
        ),
    );
}

/// Write a single-frame monochrome DICOM file with 8-bit unsigned pixels.
pub fn write_dicom_u8(path: &Path, rows: u16, columns: u16, value: u8) {
    let count = usize::from(rows) * usize::from(columns);
    write_dicom(
        path,
        rows,
        columns,
        8,
        DataElement::new(
            tags::PIXEL_DATA,
            VR::OB,
            PrimitiveValue::U8(std::iter::repeat_n(value, count).collect()),
        ),
    );
}

fn write_dicom(
    path: &Path,
    rows: u16,
    columns: u16,
    bits: u16,
    pixel_data: InMemElement,
) {
    let instance_uid = format!("2.25.{}", path.to_string_lossy().len() * 7919 + usize::from(rows));
    let obj = InMemDicomObject::from_element_iter([
        DataElement::new(tags::SOP_CLASS_UID, VR::UI, PrimitiveValue::from(CT_IMAGE_STORAGE)),
        DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(instance_uid.as_str()),
        ),
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(columns)),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(bits)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(bits)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(bits - 1)),
        DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)),
        pixel_data,
    ]);

    let file = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(CT_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(instance_uid.as_str()),
        )
        .unwrap();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    file.write_to_file(path).unwrap();
}

/// Write an attached, raw-encoded NRRD file of `unsigned short` samples.
///
/// `sizes` lists the axes fastest first; `value(x, y)` gives the sample of the
/// first plane, and any trailing axes repeat it.
pub fn write_mask_u16(path: &Path, sizes: &[usize], value: impl Fn(usize, usize) -> u16) {
    let plane: usize = sizes[0] * sizes[1];
    let planes: usize = sizes[2..].iter().product();

    let mut payload = Vec::with_capacity(plane * planes * 2);
    for _ in 0..planes {
        for y in 0..sizes[1] {
            for x in 0..sizes[0] {
                payload.extend_from_slice(&value(x, y).to_le_bytes());
            }
        }
    }

    let sizes_field = sizes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let mut bytes = format!(
        "NRRD0004\n# test fixture\ntype: unsigned short\ndimension: {}\nsizes: {}\nencoding: raw\nendian: little\n\n",
        sizes.len(),
        sizes_field
    )
    .into_bytes();
    bytes.extend_from_slice(&payload);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}
