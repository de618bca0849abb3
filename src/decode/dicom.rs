//! DICOM slice decoder.
//!
//! Each file must hold a single frame with one sample per pixel. Pixels are
//! kept in their stored integer type; no rescale or VOI transform is applied.

use std::marker::PhantomData;
use std::path::Path;

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::{DefaultDicomObject, OpenFileOptions, open_file};
use dicom_pixeldata::PixelDecoder;
use ndarray::Array2;

use super::SliceDecoder;
use crate::error::{DecodeError, LoadError};
use crate::volume::PixelType;

/// Integer types a DICOM pixel grid can be stored as.
pub trait DicomPixel: Copy + Default + Send + Sync + 'static {
    /// The matching volume element type.
    const PIXEL_TYPE: PixelType;

    /// Interpret little-endian sample bytes.
    fn decode_le(bytes: &[u8]) -> Vec<Self>;
}

macro_rules! impl_dicom_pixel {
    ($($t:ty => $kind:expr),* $(,)?) => {
        $(
            impl DicomPixel for $t {
                const PIXEL_TYPE: PixelType = $kind;

                fn decode_le(bytes: &[u8]) -> Vec<Self> {
                    bytes
                        .chunks_exact(std::mem::size_of::<$t>())
                        .map(|chunk| {
                            let mut buf = [0u8; std::mem::size_of::<$t>()];
                            buf.copy_from_slice(chunk);
                            <$t>::from_le_bytes(buf)
                        })
                        .collect()
                }
            }
        )*
    };
}

impl_dicom_pixel! {
    u8 => PixelType::Uint8,
    i8 => PixelType::Int8,
    u16 => PixelType::Uint16,
    i16 => PixelType::Int16,
    u32 => PixelType::Uint32,
    i32 => PixelType::Int32,
}

/// Read the native pixel type of a DICOM file without decoding its pixels.
pub fn probe_pixel_type(path: &Path) -> Result<PixelType, LoadError> {
    let obj = OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)
        .map_err(|e| LoadError::decode(path, DecodeError::DicomOpen(e.to_string())))?;

    pixel_type_of(&obj).map_err(|e| LoadError::decode(path, e))
}

/// Decoder producing slices of the series' native pixel type `T`.
pub struct DicomDecoder<T> {
    _pixel: PhantomData<fn() -> T>,
}

impl<T> DicomDecoder<T> {
    pub fn new() -> Self {
        Self {
            _pixel: PhantomData,
        }
    }
}

impl<T> Default for DicomDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DicomPixel> SliceDecoder for DicomDecoder<T> {
    type Pixel = T;

    fn id(&self) -> &'static str {
        "dicom"
    }

    fn decode(&self, path: &Path) -> Result<Array2<T>, LoadError> {
        decode_file::<T>(path).map_err(|e| LoadError::decode(path, e))
    }
}

fn decode_file<T: DicomPixel>(path: &Path) -> Result<Array2<T>, DecodeError> {
    let obj = open_file(path).map_err(|e| DecodeError::DicomOpen(e.to_string()))?;

    let found = pixel_type_of(&obj)?;
    if found != T::PIXEL_TYPE {
        return Err(DecodeError::PixelTypeMismatch {
            expected: T::PIXEL_TYPE,
            found,
        });
    }

    let rows = usize::from(read_u16(&obj, tags::ROWS, "Rows")?);
    let columns = usize::from(read_u16(&obj, tags::COLUMNS, "Columns")?);

    let samples = read_u16(&obj, tags::SAMPLES_PER_PIXEL, "SamplesPerPixel")?;
    if samples != 1 {
        return Err(DecodeError::UnsupportedPixelLayout(format!(
            "{samples} samples per pixel"
        )));
    }
    let frames = match obj.get(tags::NUMBER_OF_FRAMES) {
        Some(element) => element
            .to_int::<u32>()
            .map_err(|e| attribute_error("NumberOfFrames", e))?,
        None => 1,
    };
    if frames != 1 {
        return Err(DecodeError::UnsupportedPixelLayout(format!(
            "{frames} frames"
        )));
    }

    let decoded = obj
        .decode_pixel_data()
        .map_err(|e| DecodeError::PixelData(e.to_string()))?;
    let bytes = decoded.data();

    let expected = rows * columns * T::PIXEL_TYPE.byte_width();
    if bytes.len() < expected {
        return Err(DecodeError::PixelData(format!(
            "expected {expected} bytes of pixel data for {rows}x{columns}, found {}",
            bytes.len()
        )));
    }

    let pixels = T::decode_le(&bytes[..expected]);
    Array2::from_shape_vec((rows, columns), pixels)
        .map_err(|e| DecodeError::PixelData(e.to_string()))
}

fn pixel_type_of(obj: &DefaultDicomObject) -> Result<PixelType, DecodeError> {
    let bits_allocated = read_u16(obj, tags::BITS_ALLOCATED, "BitsAllocated")?;
    let representation = read_u16(obj, tags::PIXEL_REPRESENTATION, "PixelRepresentation")?;

    PixelType::from_dicom(bits_allocated, representation).ok_or_else(|| {
        DecodeError::UnsupportedPixelLayout(format!(
            "{bits_allocated} bits allocated, pixel representation {representation}"
        ))
    })
}

fn read_u16(obj: &DefaultDicomObject, tag: Tag, attribute: &'static str) -> Result<u16, DecodeError> {
    obj.element(tag)
        .map_err(|e| attribute_error(attribute, e))?
        .to_int::<u16>()
        .map_err(|e| attribute_error(attribute, e))
}

fn attribute_error(attribute: &'static str, error: impl std::fmt::Display) -> DecodeError {
    DecodeError::DicomAttribute {
        attribute,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_le() {
        assert_eq!(u16::decode_le(&[0x01, 0x02, 0xff, 0xff]), vec![0x0201, 0xffff]);
        assert_eq!(i16::decode_le(&[0xff, 0xff]), vec![-1]);
        assert_eq!(u8::decode_le(&[7, 8, 9]), vec![7, 8, 9]);
        assert_eq!(i32::decode_le(&[0, 0, 0, 0x80]), vec![i32::MIN]);
    }

    #[test]
    fn test_pixel_type_constants() {
        assert_eq!(<u16 as DicomPixel>::PIXEL_TYPE, PixelType::Uint16);
        assert_eq!(<i8 as DicomPixel>::PIXEL_TYPE, PixelType::Int8);
        assert_eq!(DicomDecoder::<u16>::new().id(), "dicom");
    }
}
