//! Reader for NRRD (Nearly Raw Raster Data) label volumes.
//!
//! Only attached headers (`.nrrd`) are handled. The payload is returned as an
//! `ArrayD<f64>` whose shape equals the header's `sizes` field in Fortran index
//! order, so axis 0 is the fastest-varying axis on disk.
//!
//! ## Supported encodings
//!
//! - `raw`
//! - `gzip` / `gz`
//! - `ascii` / `text` / `txt`

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use ndarray::{ArrayD, IxDyn, ShapeBuilder};
use thiserror::Error;

/// Errors that can occur while reading an NRRD file.
#[derive(Error, Debug)]
pub enum NrrdError {
    /// I/O error while reading the file or inflating the payload
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with `NRRD000x`
    #[error("not an NRRD file: missing NRRD000x magic")]
    BadMagic,

    /// No blank line separates the header from the payload
    #[error("header is not terminated by a blank line")]
    UnterminatedHeader,

    /// A field the reader cannot do without is absent
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field value could not be interpreted
    #[error("invalid value for field '{field}': {value}")]
    InvalidField {
        /// Field name
        field: String,
        /// Raw value from the header
        value: String,
    },

    /// The same field appears twice
    #[error("duplicate header field: {0}")]
    DuplicateField(String),

    /// Element type not known to the reader
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Encoding not known to the reader
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// The header points at a separate data file
    #[error("detached data files are not supported ({0})")]
    DetachedData(String),

    /// The payload holds fewer values than `sizes` requires
    #[error("payload too short: expected {expected} values, found {found}")]
    Truncated {
        /// Number of values required by the header
        expected: usize,
        /// Number of values available
        found: usize,
    },
}

impl NrrdError {
    fn invalid(field: &str, value: &str) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Element type of the stored samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NrrdType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
}

impl NrrdType {
    /// Parse a `type:` value, accepting the standard aliases.
    pub fn parse(value: &str) -> Option<Self> {
        let kind = match value.trim() {
            "signed char" | "int8" | "int8_t" => NrrdType::Int8,
            "uchar" | "unsigned char" | "uint8" | "uint8_t" => NrrdType::Uint8,
            "short" | "short int" | "signed short" | "signed short int" | "int16" | "int16_t" => {
                NrrdType::Int16
            }
            "ushort" | "unsigned short" | "unsigned short int" | "uint16" | "uint16_t" => {
                NrrdType::Uint16
            }
            "int" | "signed int" | "int32" | "int32_t" => NrrdType::Int32,
            "uint" | "unsigned int" | "uint32" | "uint32_t" => NrrdType::Uint32,
            "longlong" | "long long" | "long long int" | "signed long long"
            | "signed long long int" | "int64" | "int64_t" => NrrdType::Int64,
            "ulonglong" | "unsigned long long" | "unsigned long long int" | "uint64"
            | "uint64_t" => NrrdType::Uint64,
            "float" => NrrdType::Float,
            "double" => NrrdType::Double,
            _ => return None,
        };
        Some(kind)
    }

    /// Size of one sample in bytes.
    pub fn byte_width(self) -> usize {
        match self {
            NrrdType::Int8 | NrrdType::Uint8 => 1,
            NrrdType::Int16 | NrrdType::Uint16 => 2,
            NrrdType::Int32 | NrrdType::Uint32 | NrrdType::Float => 4,
            NrrdType::Int64 | NrrdType::Uint64 | NrrdType::Double => 8,
        }
    }
}

/// Payload encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Raw,
    Gzip,
    Ascii,
}

impl Encoding {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "raw" => Some(Encoding::Raw),
            "gzip" | "gz" => Some(Encoding::Gzip),
            "ascii" | "text" | "txt" => Some(Encoding::Ascii),
            _ => None,
        }
    }
}

/// Byte order of multi-byte samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Parsed NRRD header.
#[derive(Debug, Clone, PartialEq)]
pub struct NrrdHeader {
    /// Format version from the magic line
    pub version: u8,
    /// Number of axes
    pub dimension: usize,
    /// Samples per axis, fastest axis first
    pub sizes: Vec<usize>,
    /// Element type
    pub kind: NrrdType,
    /// Payload encoding
    pub encoding: Encoding,
    /// Byte order, if the header states one
    pub endian: Option<Endian>,
    /// Lines to skip before the payload
    pub line_skip: usize,
    /// Bytes to skip before the payload; `-1` means "read from the end" for raw data
    pub byte_skip: i64,
    /// Every `key: value` field, keyed by lowercased name
    pub fields: BTreeMap<String, String>,
    /// Every `key:=value` pair
    pub key_values: BTreeMap<String, String>,
}

impl NrrdHeader {
    /// Total number of samples described by `sizes`, or `None` if it overflows.
    pub fn element_count(&self) -> Option<usize> {
        self.sizes
            .iter()
            .try_fold(1usize, |acc, &size| acc.checked_mul(size))
    }

    /// Size of the decoded payload in bytes, or `None` if it overflows.
    pub fn payload_len(&self) -> Option<usize> {
        self.element_count()?.checked_mul(self.kind.byte_width())
    }

    fn overflowed(&self) -> NrrdError {
        NrrdError::invalid("sizes", &format!("{:?}", self.sizes))
    }
}

/// A decoded NRRD file.
#[derive(Debug, Clone)]
pub struct Nrrd {
    pub header: NrrdHeader,
    /// Samples converted to `f64`, shape = `header.sizes`
    pub data: ArrayD<f64>,
}

/// Read and decode an NRRD file from disk.
pub fn read_nrrd(path: &Path) -> Result<Nrrd, NrrdError> {
    let bytes = std::fs::read(path)?;
    parse_nrrd(&bytes)
}

/// Decode an NRRD file held in memory.
pub fn parse_nrrd(bytes: &[u8]) -> Result<Nrrd, NrrdError> {
    let (header, payload_start) = parse_header(bytes)?;
    log::trace!(
        "NRRD header: type={:?} sizes={:?} encoding={:?}",
        header.kind,
        header.sizes,
        header.encoding
    );

    let payload = skip_lines(&bytes[payload_start..], header.line_skip)?;
    let values = decode_payload(&header, payload)?;

    let expected = header.element_count().ok_or_else(|| header.overflowed())?;
    if values.len() < expected {
        return Err(NrrdError::Truncated {
            expected,
            found: values.len(),
        });
    }

    let mut values = values;
    values.truncate(expected);
    let data = ArrayD::from_shape_vec(IxDyn(&header.sizes).f(), values)
        .map_err(|e| NrrdError::invalid("sizes", &e.to_string()))?;

    Ok(Nrrd { header, data })
}

/// Parse the header and return it with the byte offset of the payload.
fn parse_header(bytes: &[u8]) -> Result<(NrrdHeader, usize), NrrdError> {
    let mut offset = 0;
    let mut lines = Vec::new();
    loop {
        let rest = &bytes[offset..];
        let Some(end) = rest.iter().position(|&b| b == b'\n') else {
            return Err(NrrdError::UnterminatedHeader);
        };
        let line = &rest[..end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        offset += end + 1;
        if line.is_empty() {
            break;
        }
        lines.push(String::from_utf8_lossy(line).into_owned());
    }

    let mut lines = lines.into_iter();
    let magic = lines.next().ok_or(NrrdError::BadMagic)?;
    let version = magic
        .strip_prefix("NRRD000")
        .and_then(|v| v.parse::<u8>().ok())
        .ok_or(NrrdError::BadMagic)?;

    let mut fields = BTreeMap::new();
    let mut key_values = BTreeMap::new();
    for line in lines {
        if line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(":=") {
            key_values.insert(key.to_string(), value.to_string());
        } else if let Some((key, value)) = line.split_once(": ") {
            let key = key.trim().to_lowercase();
            if fields.contains_key(&key) {
                return Err(NrrdError::DuplicateField(key));
            }
            fields.insert(key, value.trim().to_string());
        } else {
            return Err(NrrdError::invalid("header line", &line));
        }
    }

    if let Some(file) = fields.get("data file").or_else(|| fields.get("datafile")) {
        return Err(NrrdError::DetachedData(file.clone()));
    }

    let type_value = fields.get("type").ok_or(NrrdError::MissingField("type"))?;
    let kind =
        NrrdType::parse(type_value).ok_or_else(|| NrrdError::UnsupportedType(type_value.clone()))?;

    let dimension_value = fields
        .get("dimension")
        .ok_or(NrrdError::MissingField("dimension"))?;
    let dimension: usize = dimension_value
        .parse()
        .map_err(|_| NrrdError::invalid("dimension", dimension_value))?;

    let sizes_value = fields.get("sizes").ok_or(NrrdError::MissingField("sizes"))?;
    let sizes = sizes_value
        .split_whitespace()
        .map(|s| s.parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| NrrdError::invalid("sizes", sizes_value))?;
    if sizes.len() != dimension {
        return Err(NrrdError::invalid("sizes", sizes_value));
    }
    let payload_len = sizes
        .iter()
        .try_fold(kind.byte_width(), |acc, &size| acc.checked_mul(size));
    if payload_len.is_none() {
        return Err(NrrdError::invalid("sizes", sizes_value));
    }

    let encoding_value = fields
        .get("encoding")
        .ok_or(NrrdError::MissingField("encoding"))?;
    let encoding = Encoding::parse(encoding_value)
        .ok_or_else(|| NrrdError::UnsupportedEncoding(encoding_value.clone()))?;

    let endian = match fields.get("endian").map(String::as_str) {
        None => None,
        Some("little") => Some(Endian::Little),
        Some("big") => Some(Endian::Big),
        Some(other) => return Err(NrrdError::invalid("endian", other)),
    };

    let line_skip = match fields.get("line skip").or_else(|| fields.get("lineskip")) {
        Some(value) => value
            .parse()
            .map_err(|_| NrrdError::invalid("line skip", value))?,
        None => 0,
    };
    let byte_skip = match fields.get("byte skip").or_else(|| fields.get("byteskip")) {
        Some(value) => {
            let skip: i64 = value
                .parse()
                .map_err(|_| NrrdError::invalid("byte skip", value))?;
            if skip < -1 || (skip == -1 && encoding != Encoding::Raw) {
                return Err(NrrdError::invalid("byte skip", value));
            }
            skip
        }
        None => 0,
    };

    let header = NrrdHeader {
        version,
        dimension,
        sizes,
        kind,
        encoding,
        endian,
        line_skip,
        byte_skip,
        fields,
        key_values,
    };
    Ok((header, offset))
}

fn skip_lines(mut data: &[u8], count: usize) -> Result<&[u8], NrrdError> {
    for _ in 0..count {
        let end = data
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(NrrdError::Truncated {
                expected: count,
                found: 0,
            })?;
        data = &data[end + 1..];
    }
    Ok(data)
}

fn decode_payload(header: &NrrdHeader, payload: &[u8]) -> Result<Vec<f64>, NrrdError> {
    match header.encoding {
        Encoding::Ascii => parse_ascii(payload),
        Encoding::Raw => {
            let needed = header.payload_len().ok_or_else(|| header.overflowed())?;
            let bytes = if header.byte_skip == -1 {
                &payload[payload.len().saturating_sub(needed)..]
            } else {
                apply_byte_skip(payload, header.byte_skip)
            };
            samples_to_f64(header, bytes)
        }
        Encoding::Gzip => {
            let mut inflated = Vec::new();
            GzDecoder::new(payload).read_to_end(&mut inflated)?;
            samples_to_f64(header, apply_byte_skip(&inflated, header.byte_skip))
        }
    }
}

fn apply_byte_skip(bytes: &[u8], skip: i64) -> &[u8] {
    let skip = usize::try_from(skip).unwrap_or(0);
    &bytes[skip.min(bytes.len())..]
}

fn parse_ascii(payload: &[u8]) -> Result<Vec<f64>, NrrdError> {
    String::from_utf8_lossy(payload)
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| NrrdError::invalid("data", token))
        })
        .collect()
}

/// Convert fixed-width samples to `f64`.
fn samples_to_f64(header: &NrrdHeader, bytes: &[u8]) -> Result<Vec<f64>, NrrdError> {
    let width = header.kind.byte_width();
    let endian = match header.endian {
        Some(endian) => endian,
        None if width == 1 => Endian::Little,
        None => return Err(NrrdError::MissingField("endian")),
    };

    macro_rules! convert {
        ($t:ty, $to_f64:expr) => {
            bytes
                .chunks_exact(width)
                .map(|chunk| {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(chunk);
                    let value = match endian {
                        Endian::Little => <$t>::from_le_bytes(buf),
                        Endian::Big => <$t>::from_be_bytes(buf),
                    };
                    $to_f64(value)
                })
                .collect()
        };
    }

    let values: Vec<f64> = match header.kind {
        NrrdType::Int8 => convert!(i8, f64::from),
        NrrdType::Uint8 => convert!(u8, f64::from),
        NrrdType::Int16 => convert!(i16, f64::from),
        NrrdType::Uint16 => convert!(u16, f64::from),
        NrrdType::Int32 => convert!(i32, f64::from),
        NrrdType::Uint32 => convert!(u32, f64::from),
        NrrdType::Int64 => convert!(i64, |v: i64| v as f64),
        NrrdType::Uint64 => convert!(u64, |v: u64| v as f64),
        NrrdType::Float => convert!(f32, f64::from),
        NrrdType::Double => convert!(f64, std::convert::identity),
    };
    Ok(values)
}
