use crate::{error::ObservationError, ObservationData, ObservationProto};
use image::{io::Reader, DynamicImage, GenericImageView};
use ndarray::{Array3, ArrayD, Axis, IxDyn};
use std::io::Cursor;

/// Decodes PNG bytes into an array of shape `[height, width, channels]` with values in `[0, 1]`.
///
/// The image keeps its own number of channels: 1 for grayscale, 2 for grayscale with alpha,
/// 4 for RGBA and 3 for anything else. If `grayscale` is `true`, all channels are averaged
/// into one and the returned array has shape `[height, width, 1]`.
pub fn process_pixels(bytes: &[u8], grayscale: bool) -> Result<Array3<f32>, ObservationError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();
    let (channels, raw) = native_pixels(&img);
    let (h, w, len) = (height as usize, width as usize, raw.len());
    let pixels = Array3::from_shape_vec((h, w, channels), raw)
        .map_err(|_| ObservationError::ShapeMismatch {
            expected: vec![h, w, channels],
            actual: vec![len],
        })?
        .mapv(|v| v as f32 / 255.0);

    if grayscale {
        Ok((pixels.sum_axis(Axis(2)) / channels as f32).insert_axis(Axis(2)))
    } else {
        Ok(pixels)
    }
}

fn native_pixels(img: &DynamicImage) -> (usize, Vec<u8>) {
    match img.color().channel_count() {
        1 => (1, img.to_luma8().into_raw()),
        2 => (2, img.to_luma_alpha8().into_raw()),
        4 => (4, img.to_rgba8().into_raw()),
        _ => (3, img.to_rgb8().into_raw()),
    }
}

/// `(height, width)` read from the image header, without decoding pixels.
fn image_size(bytes: &[u8]) -> Result<(usize, usize), ObservationError> {
    let format = image::guess_format(bytes)?;
    let (width, height) = Reader::with_format(Cursor::new(bytes), format).into_dimensions()?;
    Ok((height as usize, width as usize))
}

/// Decodes an observation into an array of shape `expected_shape`.
///
/// Float payloads are reshaped and must have as many elements as the expected shape.
/// PNG payloads are decoded with [`process_pixels`]. Their height and width are read from
/// the image header and compared to the expected shape before any pixel is decoded; the
/// decoded image must then have the expected number of channels. `grayscale` forces
/// single-channel decoding.
pub fn decode_observation(
    obs: &ObservationProto,
    expected_shape: &[usize],
    grayscale: bool,
) -> Result<ArrayD<f32>, ObservationError> {
    match &obs.data {
        ObservationData::FloatData(data) => {
            let mismatch = || ObservationError::ShapeMismatch {
                expected: expected_shape.to_vec(),
                actual: vec![data.len()],
            };
            if data.len() != expected_shape.iter().product::<usize>() {
                return Err(mismatch());
            }
            ArrayD::from_shape_vec(IxDyn(expected_shape), data.clone()).map_err(|_| mismatch())
        }
        ObservationData::CompressedData(bytes) => {
            let (height, width) = image_size(bytes)?;
            if expected_shape.len() != 3 || expected_shape[..2] != [height, width] {
                return Err(ObservationError::ShapeMismatch {
                    expected: expected_shape.to_vec(),
                    actual: vec![height, width],
                });
            }

            let img = process_pixels(bytes, grayscale)?;
            if img.shape() != expected_shape {
                return Err(ObservationError::ShapeMismatch {
                    expected: expected_shape.to_vec(),
                    actual: img.shape().to_vec(),
                });
            }
            Ok(img.into_dyn())
        }
    }
}
