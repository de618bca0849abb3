//! Array builder: stack a file manifest into one `(N, rows, columns, 1)` volume.

use std::path::{Path, PathBuf};

use ndarray::parallel::prelude::*;
use ndarray::{Array3, Array4, ArrayViewMut2, Axis};
use rayon::prelude::*;

use crate::config::LoadOptions;
use crate::decode::{
    DicomDecoder, DicomPixel, MaskDecoder, SeriesFormat, SliceDecoder, probe_pixel_type,
};
use crate::error::{DecodeError, LoadError};
use crate::volume::{PixelType, Volume};

/// Stack every file of `paths` into a single volume.
///
/// The decoder is chosen once from the first path's suffix. DICOM series keep
/// their native pixel type; NRRD masks are stacked as `f64`.
pub fn list_as_volume(paths: &[PathBuf], options: &LoadOptions) -> Result<Volume, LoadError> {
    let first = paths.first().ok_or(LoadError::EmptyInput)?;
    let format = SeriesFormat::from_path(first).ok_or_else(|| LoadError::UnsupportedFormat {
        path: first.clone(),
    })?;
    log::debug!("Stacking {} {} files", paths.len(), format.display_name());

    match format {
        SeriesFormat::Dicom => stack_dicom(first, paths, options),
        SeriesFormat::Nrrd => stack_slices(&MaskDecoder, paths, options).map(Volume::Float64),
    }
}

fn stack_dicom(first: &Path, paths: &[PathBuf], options: &LoadOptions) -> Result<Volume, LoadError> {
    fn stack<T: DicomPixel>(
        paths: &[PathBuf],
        options: &LoadOptions,
    ) -> Result<Array4<T>, LoadError> {
        stack_slices(&DicomDecoder::<T>::new(), paths, options)
    }

    let volume = match probe_pixel_type(first)? {
        PixelType::Uint8 => Volume::Uint8(stack(paths, options)?),
        PixelType::Int8 => Volume::Int8(stack(paths, options)?),
        PixelType::Uint16 => Volume::Uint16(stack(paths, options)?),
        PixelType::Int16 => Volume::Int16(stack(paths, options)?),
        PixelType::Uint32 => Volume::Uint32(stack(paths, options)?),
        PixelType::Int32 => Volume::Int32(stack(paths, options)?),
        PixelType::Float64 => {
            return Err(LoadError::decode(
                first,
                DecodeError::UnsupportedPixelLayout("float64 pixel data".to_string()),
            ));
        }
    };
    Ok(volume)
}

/// Decode each path with `decoder` and place it at its manifest position.
///
/// The first file sizes the volume. Slice `i` of the result is always
/// `paths[i]`, whether decoding runs sequentially or on the rayon pool.
pub fn stack_slices<D: SliceDecoder>(
    decoder: &D,
    paths: &[PathBuf],
    options: &LoadOptions,
) -> Result<Array4<D::Pixel>, LoadError> {
    let first = paths.first().ok_or(LoadError::EmptyInput)?;
    let (rows, columns) = decoder.decode(first)?.dim();
    log::trace!(
        "{}: slice grid {}x{} from {:?}",
        decoder.id(),
        rows,
        columns,
        first
    );

    let mut volume =
        Array3::<D::Pixel>::from_elem((paths.len(), rows, columns), D::Pixel::default());

    if options.parallel {
        let fill = |volume: &mut Array3<D::Pixel>| {
            volume
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(paths.par_iter())
                .try_for_each(|(slot, path)| place_slice(decoder, path, slot))
        };
        match options.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                pool.install(|| fill(&mut volume))?;
            }
            None => fill(&mut volume)?,
        }
    } else {
        for (index, path) in paths.iter().enumerate() {
            place_slice(decoder, path, volume.index_axis_mut(Axis(0), index))?;
        }
    }

    Ok(volume.insert_axis(Axis(3)))
}

fn place_slice<D: SliceDecoder>(
    decoder: &D,
    path: &Path,
    mut slot: ArrayViewMut2<'_, D::Pixel>,
) -> Result<(), LoadError> {
    let slice = decoder.decode(path)?;
    if slice.dim() != slot.dim() {
        return Err(LoadError::SliceShapeMismatch {
            path: path.to_path_buf(),
            expected: slot.dim(),
            found: slice.dim(),
        });
    }
    slot.assign(&slice);
    Ok(())
}
