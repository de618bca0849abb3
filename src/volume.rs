//! The stacked output volume and its element types.

use std::fmt;
use std::path::Path;

use ndarray::Array4;
use ndarray_npy::WriteNpyError;
use serde::{Deserialize, Serialize};

/// Element type of a volume, named after the matching NumPy dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    /// 8-bit unsigned
    Uint8,
    /// 8-bit signed
    Int8,
    /// 16-bit unsigned, the usual CT/MR storage type
    Uint16,
    /// 16-bit signed
    Int16,
    /// 32-bit unsigned
    Uint32,
    /// 32-bit signed
    Int32,
    /// 64-bit float, used for masks
    Float64,
}

impl PixelType {
    /// NumPy-style dtype name.
    pub fn name(self) -> &'static str {
        match self {
            PixelType::Uint8 => "uint8",
            PixelType::Int8 => "int8",
            PixelType::Uint16 => "uint16",
            PixelType::Int16 => "int16",
            PixelType::Uint32 => "uint32",
            PixelType::Int32 => "int32",
            PixelType::Float64 => "float64",
        }
    }

    /// Map DICOM *Bits Allocated* and *Pixel Representation* to a native type.
    ///
    /// Returns `None` for widths without an integer counterpart.
    pub fn from_dicom(bits_allocated: u16, pixel_representation: u16) -> Option<Self> {
        let signed = pixel_representation == 1;
        match (bits_allocated, signed) {
            (8, false) => Some(PixelType::Uint8),
            (8, true) => Some(PixelType::Int8),
            (16, false) => Some(PixelType::Uint16),
            (16, true) => Some(PixelType::Int16),
            (32, false) => Some(PixelType::Uint32),
            (32, true) => Some(PixelType::Int32),
            _ => None,
        }
    }

    /// Size of one element in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            PixelType::Uint8 | PixelType::Int8 => 1,
            PixelType::Uint16 | PixelType::Int16 => 2,
            PixelType::Uint32 | PixelType::Int32 => 4,
            PixelType::Float64 => 8,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stacked volume shaped `(slices, rows, columns, 1)`.
///
/// DICOM series keep their native pixel type; masks are always `Float64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Volume {
    /// 8-bit unsigned DICOM pixels
    Uint8(Array4<u8>),
    /// 8-bit signed DICOM pixels
    Int8(Array4<i8>),
    /// 16-bit unsigned DICOM pixels
    Uint16(Array4<u16>),
    /// 16-bit signed DICOM pixels
    Int16(Array4<i16>),
    /// 32-bit unsigned DICOM pixels
    Uint32(Array4<u32>),
    /// 32-bit signed DICOM pixels
    Int32(Array4<i32>),
    /// Mask samples
    Float64(Array4<f64>),
}

/// Apply the same expression to whichever array a `Volume` holds.
macro_rules! with_array {
    ($volume:expr, $array:ident => $body:expr) => {
        match $volume {
            Volume::Uint8($array) => $body,
            Volume::Int8($array) => $body,
            Volume::Uint16($array) => $body,
            Volume::Int16($array) => $body,
            Volume::Uint32($array) => $body,
            Volume::Int32($array) => $body,
            Volume::Float64($array) => $body,
        }
    };
}

impl Volume {
    /// Shape as `[slices, rows, columns, channels]`.
    pub fn shape(&self) -> [usize; 4] {
        with_array!(self, array => {
            let (n, rows, columns, channels) = array.dim();
            [n, rows, columns, channels]
        })
    }

    /// Element type of the volume.
    pub fn pixel_type(&self) -> PixelType {
        match self {
            Volume::Uint8(_) => PixelType::Uint8,
            Volume::Int8(_) => PixelType::Int8,
            Volume::Uint16(_) => PixelType::Uint16,
            Volume::Int16(_) => PixelType::Int16,
            Volume::Uint32(_) => PixelType::Uint32,
            Volume::Int32(_) => PixelType::Int32,
            Volume::Float64(_) => PixelType::Float64,
        }
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.shape()[0]
    }

    /// True when the volume holds no slices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the array if the volume holds `u16` pixels.
    pub fn as_u16(&self) -> Option<&Array4<u16>> {
        match self {
            Volume::Uint16(array) => Some(array),
            _ => None,
        }
    }

    /// Borrow the array if the volume holds `f64` values.
    pub fn as_f64(&self) -> Option<&Array4<f64>> {
        match self {
            Volume::Float64(array) => Some(array),
            _ => None,
        }
    }

    /// Convert to `f64` regardless of the stored type.
    pub fn to_f64(&self) -> Array4<f64> {
        with_array!(self, array => array.mapv(f64::from))
    }

    /// Write the volume as a NumPy `.npy` file, keeping its element type.
    pub fn write_npy(&self, path: &Path) -> Result<(), WriteNpyError> {
        with_array!(self, array => ndarray_npy::write_npy(path, array))
    }
}
