//! Frame encoding: optional downscale, then JPEG.
//!
//! The encoder never touches the caller's sample. When no resize is needed it
//! compresses the sample's buffer directly; otherwise it resamples into a
//! scratch buffer first. Callers encoding every cycle pass their own scratch
//! to [`ImageEncoder::encode_with_scratch`] so it is allocated once.

mod resample;

pub use resample::{resample_bilinear, resample_bilinear_into, target_dimensions};

use std::time::Instant;

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use tracing::trace;

use crate::types::FrameSample;
use crate::{Result, UplinkError};

/// Compressed frame ready for the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Baseline JPEG bytes
    pub bytes: Vec<u8>,
    /// Quality the codec was run at
    pub quality: u8,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// JPEG encoder with an optional bound on the larger dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageEncoder {
    quality: u8,
    max_dimension: Option<u32>,
}

impl ImageEncoder {
    /// Create an encoder; quality is clamped to 1-100 since the codec rejects 0
    pub fn new(quality: u8, max_dimension: Option<u32>) -> Self {
        Self { quality: quality.clamp(1, 100), max_dimension: max_dimension.filter(|m| *m > 0) }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn max_dimension(&self) -> Option<u32> {
        self.max_dimension
    }

    /// Encode a frame sample
    ///
    /// # Errors
    ///
    /// Returns [`UplinkError::Encoding`] if the buffer is empty, a dimension is
    /// zero, the buffer length does not match `width * height * 3`, or the
    /// codec fails.
    pub fn encode(&self, sample: &FrameSample) -> Result<EncodedImage> {
        self.encode_with_scratch(sample, &mut Vec::new())
    }

    /// Encode a frame sample, downscaling into `scratch` when a resize is needed
    ///
    /// `scratch` is left untouched when the frame is already within bounds.
    /// Its contents are overwritten otherwise.
    pub fn encode_with_scratch(&self, sample: &FrameSample, scratch: &mut Vec<u8>) -> Result<EncodedImage> {
        validate(sample)?;
        let started = Instant::now();

        let (width, height) = target_dimensions(sample.width, sample.height, self.max_dimension);
        let pixels: &[u8] = if sample.has_dimensions(width, height) {
            &sample.pixels
        } else {
            resample_bilinear_into(&sample.pixels, sample.width, sample.height, width, height, scratch);
            scratch
        };

        let mut bytes = Vec::with_capacity(pixels.len() / 8);
        JpegEncoder::new_with_quality(&mut bytes, self.quality)
            .encode(pixels, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| UplinkError::encoding_with_source("JPEG encode failed", Box::new(e)))?;

        trace!(
            src_width = sample.width,
            src_height = sample.height,
            width,
            height,
            bytes = bytes.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Frame encoded"
        );

        Ok(EncodedImage { bytes, quality: self.quality, width, height })
    }
}

fn validate(sample: &FrameSample) -> Result<()> {
    if sample.pixels.is_empty() {
        return Err(UplinkError::encoding("frame buffer is empty"));
    }
    if sample.width == 0 || sample.height == 0 {
        return Err(UplinkError::encoding(format!(
            "frame has zero dimension ({}x{})",
            sample.width, sample.height
        )));
    }
    let expected = FrameSample::expected_len(sample.width, sample.height);
    if sample.pixels.len() != expected {
        return Err(UplinkError::encoding(format!(
            "buffer length {} does not match {}x{} RGB ({} bytes)",
            sample.pixels.len(),
            sample.width,
            sample.height,
            expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::gradient_frame;
    use image::{GenericImageView, ImageFormat};
    use proptest::prelude::*;

    fn decoded_dimensions(image: &EncodedImage) -> (u32, u32) {
        image::load_from_memory_with_format(&image.bytes, ImageFormat::Jpeg)
            .expect("output should be a decodable JPEG")
            .dimensions()
    }

    #[test]
    fn hd_frame_downscales_to_640x360() {
        let sample = gradient_frame(1280, 720);
        let encoded = ImageEncoder::new(75, Some(640)).encode(&sample).unwrap();

        assert_eq!((encoded.width, encoded.height), (640, 360));
        assert_eq!(decoded_dimensions(&encoded), (640, 360));
        assert_eq!(encoded.quality, 75);
    }

    #[test]
    fn no_bound_keeps_dimensions() {
        let sample = gradient_frame(97, 41);
        let encoded = ImageEncoder::new(90, None).encode(&sample).unwrap();

        assert_eq!((encoded.width, encoded.height), (97, 41));
        assert_eq!(decoded_dimensions(&encoded), (97, 41));
    }

    #[test]
    fn output_is_jpeg() {
        let encoded = ImageEncoder::new(50, None).encode(&gradient_frame(16, 16)).unwrap();
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&encoded.bytes[encoded.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn input_sample_is_not_mutated() {
        let sample = gradient_frame(64, 48);
        let before = sample.clone();
        ImageEncoder::new(60, Some(32)).encode(&sample).unwrap();
        assert_eq!(sample, before);
    }

    #[test]
    fn scratch_buffer_matches_fresh_encode() {
        let encoder = ImageEncoder::new(75, Some(64));
        let sample = gradient_frame(160, 90);
        let mut scratch = Vec::new();

        let first = encoder.encode_with_scratch(&sample, &mut scratch).unwrap();
        assert_eq!(scratch.len(), 64 * 36 * 3);
        let ptr = scratch.as_ptr();

        let second = encoder.encode_with_scratch(&sample, &mut scratch).unwrap();
        assert_eq!(scratch.as_ptr(), ptr);
        assert_eq!(first, second);
        assert_eq!(second, encoder.encode(&sample).unwrap());
    }

    #[test]
    fn scratch_is_unused_without_resize() {
        let mut scratch = Vec::new();
        ImageEncoder::new(75, Some(64)).encode_with_scratch(&gradient_frame(32, 16), &mut scratch).unwrap();
        assert_eq!(scratch.capacity(), 0);
    }

    #[test]
    fn quality_zero_is_clamped() {
        let encoder = ImageEncoder::new(0, None);
        assert_eq!(encoder.quality(), 1);
        assert!(encoder.encode(&gradient_frame(8, 8)).is_ok());
    }

    #[test]
    fn lower_quality_is_smaller() {
        let sample = gradient_frame(320, 240);
        let low = ImageEncoder::new(10, None).encode(&sample).unwrap();
        let high = ImageEncoder::new(95, None).encode(&sample).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn malformed_buffers_are_rejected() {
        let encoder = ImageEncoder::new(75, None);

        let empty = FrameSample::new(4, 4, Vec::new(), 0);
        let short = FrameSample::new(4, 4, vec![0; 47], 0);
        let zero_width = FrameSample::new(0, 4, vec![0; 12], 0);

        for sample in [empty, short, zero_width] {
            let err = encoder.encode(&sample).unwrap_err();
            assert!(matches!(err, UplinkError::Encoding { .. }), "unexpected {err:?}");
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn encoded_dimensions_follow_bound(
            width in 1u32..200,
            height in 1u32..200,
            max in prop::option::of(1u32..150)
        ) {
            let sample = gradient_frame(width, height);
            let encoded = ImageEncoder::new(70, max).encode(&sample).unwrap();

            prop_assert_eq!((encoded.width, encoded.height), target_dimensions(width, height, max));
            prop_assert_eq!(decoded_dimensions(&encoded), (encoded.width, encoded.height));
            if max.is_none() {
                prop_assert_eq!((encoded.width, encoded.height), (width, height));
            }
        }
    }
}
