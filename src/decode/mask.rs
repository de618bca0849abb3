//! NRRD label-mask slice decoder.

use std::path::Path;

use ndarray::{Array2, ArrayD, Axis, Ix2};

use super::SliceDecoder;
use crate::error::{DecodeError, LoadError};
use crate::nrrd::{NrrdError, read_nrrd};

/// Decoder for label masks stored one slice per NRRD file.
///
/// Only the first two axes are kept (trailing axes are read at index 0), and
/// the grid is transposed so that NRRD's fastest axis becomes the column axis,
/// matching the `(rows, columns)` layout of DICOM pixel grids.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaskDecoder;

impl SliceDecoder for MaskDecoder {
    type Pixel = f64;

    fn id(&self) -> &'static str {
        "nrrd"
    }

    fn decode(&self, path: &Path) -> Result<Array2<f64>, LoadError> {
        let nrrd = read_nrrd(path).map_err(|e| LoadError::decode(path, e))?;
        first_plane_transposed(nrrd.data).map_err(|e| LoadError::decode(path, e))
    }
}

/// Reduce an N-D array to its first two axes, then transpose.
fn first_plane_transposed(mut data: ArrayD<f64>) -> Result<Array2<f64>, DecodeError> {
    if data.ndim() < 2 {
        return Err(DecodeError::Nrrd(NrrdError::InvalidField {
            field: "dimension".to_string(),
            value: format!("{} (a mask slice needs at least 2 axes)", data.ndim()),
        }));
    }
    while data.ndim() > 2 {
        let last = Axis(data.ndim() - 1);
        if data.len_of(last) == 0 {
            return Err(DecodeError::UnsupportedPixelLayout(
                "empty trailing axis".to_string(),
            ));
        }
        data = data.index_axis_move(last, 0);
    }

    let plane = data
        .into_dimensionality::<Ix2>()
        .map_err(|e| DecodeError::UnsupportedPixelLayout(e.to_string()))?;
    Ok(plane.reversed_axes().as_standard_layout().into_owned())
}
