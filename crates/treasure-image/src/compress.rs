// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Adaptive compressor: shrink a photo until its base64 payload fits the
// transport's byte budget.
//
// The image is resampled once to fit the dimension bounds, then re-encoded at
// falling JPEG quality until the payload fits. The search is a plain bounded
// loop: at most `max_attempts + 1` encodes, never an oversized result.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbImage;
use image::imageops::FilterType;
use tracing::{debug, info, instrument, warn};
use treasure_core::error::{Result, TreasureError};
use treasure_core::types::{CompressedImage, CompressionConfig, RawImage};

use crate::processor::{ImageProcessor, encode_jpeg};

/// Slack for float drift when comparing quality against `min_quality`.
const QUALITY_EPSILON: f64 = 1e-9;

/// Turns a resampled frame into encoded bytes at a given quality.
///
/// The compressor owns the search; encoders only encode.
pub trait FrameEncoder: Send + Sync {
    fn encode(&self, frame: &RgbImage, quality: f64) -> Result<Vec<u8>>;
}

/// Baseline JPEG via the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegFrameEncoder;

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&self, frame: &RgbImage, quality: f64) -> Result<Vec<u8>> {
        encode_jpeg(frame, quality_percent(quality))
    }
}

/// Map a (0, 1] quality factor onto the encoder's 1-100 scale.
pub fn quality_percent(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Length of the padded base64 text for `len` input bytes.
pub fn base64_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Largest size within `max_width` x `max_height` with the source aspect
/// ratio. Never upscales. Each axis is rounded half-to-even on its own, so the
/// result can be a pixel off the exact ratio.
pub fn target_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        f64::from(max_width) / f64::from(width),
        f64::from(max_height) / f64::from(height),
    );
    let fit = |side: u32, bound: u32| -> u32 {
        let scaled = (f64::from(side) * scale).round_ties_even();
        (scaled as u32).clamp(1, bound)
    };
    (fit(width, max_width), fit(height, max_height))
}

/// Size-bounded image compressor.
///
/// ```ignore
/// let compressor = ImageCompressor::new(CompressionConfig::default())?;
/// let image = compressor.compress(&raw)?;
/// assert!(image.encoded_size <= 35 * 1024);
/// ```
pub struct ImageCompressor<E = JpegFrameEncoder> {
    config: CompressionConfig,
    encoder: E,
}

impl ImageCompressor<JpegFrameEncoder> {
    pub fn new(config: CompressionConfig) -> Result<Self> {
        Self::with_encoder(config, JpegFrameEncoder)
    }
}

impl<E: FrameEncoder> ImageCompressor<E> {
    pub fn with_encoder(config: CompressionConfig, encoder: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, encoder })
    }

    /// Decode, fit to the dimension bounds, and search for a quality that
    /// meets the byte budget.
    ///
    /// Fails with `Decode` for unreadable input and `ImageTooLarge` when no
    /// attempted quality fits.
    #[instrument(
        skip_all,
        fields(
            raw_w = raw.width,
            raw_h = raw.height,
            declared_size = raw.declared_size,
            budget = self.config.size_budget_bytes
        )
    )]
    pub fn compress(&self, raw: &RawImage) -> Result<CompressedImage> {
        let processor = ImageProcessor::from_bytes(&raw.bytes)?;
        let (width, height) = target_dimensions(
            processor.width(),
            processor.height(),
            self.config.max_width,
            self.config.max_height,
        );
        let frame = processor
            .resize_exact(width, height, FilterType::CatmullRom)
            .into_rgb8();
        self.search(&frame)
    }

    /// Quality search over an already-resampled frame.
    pub fn search(&self, frame: &RgbImage) -> Result<CompressedImage> {
        let budget = self.config.size_budget_bytes;
        let mut smallest = usize::MAX;

        for attempt in 0..=self.config.max_attempts {
            let quality = round_quality(
                self.config.initial_quality - f64::from(attempt) * self.config.quality_step,
            );
            if quality < self.config.min_quality - QUALITY_EPSILON {
                debug!(attempt, quality, "quality floor reached");
                break;
            }

            let jpeg = self.encoder.encode(frame, quality)?;
            let encoded_size = base64_len(jpeg.len());
            debug!(attempt, quality, encoded_size, "encoded candidate");

            if encoded_size <= budget {
                info!(
                    width = frame.width(),
                    height = frame.height(),
                    quality,
                    encoded_size,
                    attempts = attempt + 1,
                    "image compressed within budget"
                );
                return Ok(CompressedImage {
                    data: STANDARD.encode(&jpeg),
                    width: frame.width(),
                    height: frame.height(),
                    encoded_size,
                    quality,
                });
            }
            smallest = smallest.min(encoded_size);
        }

        warn!(smallest, budget, "no quality met the size budget");
        Err(TreasureError::ImageTooLarge { smallest, budget })
    }
}

/// Snap to six decimals so 0.6 - 5 * 0.03 reports as 0.45.
fn round_quality(quality: f64) -> f64 {
    (quality * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Records every quality it is asked for and returns `size_for(quality)`
    /// zero bytes.
    struct ScriptedEncoder {
        size_for: fn(f64) -> usize,
        calls: Mutex<Vec<f64>>,
    }

    impl ScriptedEncoder {
        fn new(size_for: fn(f64) -> usize) -> Self {
            Self {
                size_for,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<f64> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl FrameEncoder for ScriptedEncoder {
        fn encode(&self, _frame: &RgbImage, quality: f64) -> Result<Vec<u8>> {
            self.calls.lock().expect("calls lock").push(quality);
            Ok(vec![0u8; (self.size_for)(quality)])
        }
    }

    fn encoded(img: RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, format)
            .expect("encode fixture");
        out.into_inner()
    }

    fn raw(bytes: Vec<u8>, width: u32, height: u32) -> RawImage {
        RawImage {
            declared_size: bytes.len() as u64,
            bytes,
            width,
            height,
        }
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) * 127 / (width + height)) as u8,
            ])
        })
    }

    /// Deterministic high-entropy pixels that JPEG compresses badly.
    fn noise(width: u32, height: u32) -> RgbImage {
        let mut state: u32 = 0x9E37_79B9;
        RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [a, b, c, _] = state.to_le_bytes();
            Rgb([a, b, c])
        })
    }

    fn small_png() -> RawImage {
        raw(encoded(gradient(8, 8), ImageFormat::Png), 8, 8)
    }

    // -- Dimensions ------------------------------------------------------------

    #[test]
    fn landscape_is_bounded_by_width() {
        assert_eq!(target_dimensions(4000, 3000, 600, 600), (600, 450));
    }

    #[test]
    fn portrait_is_bounded_by_height() {
        assert_eq!(target_dimensions(3000, 4000, 600, 600), (450, 600));
    }

    #[test]
    fn small_images_are_never_upscaled() {
        assert_eq!(target_dimensions(500, 300, 600, 600), (500, 300));
    }

    #[test]
    fn rounding_is_half_to_even_per_axis() {
        // 125 * 0.5 = 62.5 rounds down to even, 135 * 0.5 = 67.5 rounds up.
        assert_eq!(target_dimensions(1000, 125, 500, 500), (500, 62));
        assert_eq!(target_dimensions(1000, 135, 500, 500), (500, 68));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(target_dimensions(6000, 2, 600, 600), (600, 1));
    }

    #[test]
    fn non_square_bounds_respect_both_axes() {
        let (w, h) = target_dimensions(700, 650, 600, 300);
        assert!(w <= 600 && h <= 300, "{w}x{h}");
    }

    // -- Quality search --------------------------------------------------------

    #[test]
    fn first_fit_returns_initial_quality() {
        let compressor =
            ImageCompressor::with_encoder(CompressionConfig::default(), ScriptedEncoder::new(|_| 100))
                .expect("compressor");
        let image = compressor.compress(&small_png()).expect("fits");
        assert_eq!(image.quality, 0.6);
        assert_eq!(compressor.encoder.calls().len(), 1);
    }

    #[test]
    fn returns_highest_quality_that_fits() {
        // Only qualities at or below 0.45 produce a small enough payload.
        let encoder = ScriptedEncoder::new(|q| if q <= 0.45 + 1e-9 { 1_000 } else { 90_000 });
        let compressor =
            ImageCompressor::with_encoder(CompressionConfig::default(), encoder).expect("compressor");
        let image = compressor.compress(&small_png()).expect("fits");

        assert!((image.quality - 0.45).abs() < 1e-9, "quality {}", image.quality);
        assert_eq!(
            compressor.encoder.calls(),
            vec![0.6, 0.57, 0.54, 0.51, 0.48, 0.45]
        );
    }

    #[test]
    fn quality_floor_stops_the_search() {
        let encoder = ScriptedEncoder::new(|_| 1_000_000);
        let compressor =
            ImageCompressor::with_encoder(CompressionConfig::default(), encoder).expect("compressor");
        let err = compressor.compress(&small_png()).unwrap_err();

        assert!(matches!(err, TreasureError::ImageTooLarge { budget, .. } if budget == 35 * 1024));
        let calls = compressor.encoder.calls();
        // 0.60, 0.57, ..., 0.21; the next step (0.18) is below the 0.2 floor.
        assert_eq!(calls.len(), 14);
        assert!(calls.iter().all(|q| *q >= 0.2));
    }

    #[test]
    fn attempt_cap_bounds_encodes() {
        let config = CompressionConfig {
            quality_step: 0.01,
            min_quality: 0.01,
            max_attempts: 5,
            ..Default::default()
        };
        let compressor = ImageCompressor::with_encoder(config, ScriptedEncoder::new(|_| 1_000_000))
            .expect("compressor");
        assert!(compressor.compress(&small_png()).is_err());
        assert_eq!(compressor.encoder.calls().len(), 6);
    }

    #[test]
    fn too_large_reports_smallest_attempt() {
        // Size shrinks with quality but never reaches the budget.
        let encoder = ScriptedEncoder::new(|q| 40_000 + (q * 10_000.0) as usize);
        let compressor =
            ImageCompressor::with_encoder(CompressionConfig::default(), encoder).expect("compressor");
        match compressor.compress(&small_png()) {
            Err(TreasureError::ImageTooLarge { smallest, budget }) => {
                assert!(smallest > budget);
                // The last attempt, at 0.21, is the smallest.
                assert_eq!(smallest, base64_len(40_000 + (0.21f64 * 10_000.0) as usize));
            }
            other => panic!("expected ImageTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn decode_failure_never_reaches_encoder() {
        let compressor =
            ImageCompressor::with_encoder(CompressionConfig::default(), ScriptedEncoder::new(|_| 1))
                .expect("compressor");
        let err = compressor.compress(&raw(b"GIF89a-truncated".to_vec(), 10, 10)).unwrap_err();
        assert!(matches!(err, TreasureError::Decode(_)));
        assert!(compressor.encoder.calls().is_empty());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = CompressionConfig {
            size_budget_bytes: 0,
            ..Default::default()
        };
        assert!(ImageCompressor::new(config).is_err());
    }

    // -- Real JPEG encoding ------------------------------------------------------

    #[test]
    fn real_jpeg_fits_budget_and_bounds() {
        let compressor = ImageCompressor::new(CompressionConfig::default()).expect("compressor");
        let source = raw(encoded(gradient(1200, 900), ImageFormat::Png), 1200, 900);
        let image = compressor.compress(&source).expect("gradient compresses");

        assert_eq!((image.width, image.height), (600, 450));
        assert!(image.encoded_size <= 35 * 1024);
        assert_eq!(image.data.len(), image.encoded_size);
        assert!(image.quality >= 0.2 && image.quality <= 0.6);

        let jpeg = STANDARD.decode(&image.data).expect("valid base64");
        let decoded = image::load_from_memory(&jpeg).expect("valid jpeg");
        assert_eq!((decoded.width(), decoded.height()), (600, 450));
    }

    #[test]
    fn large_camera_photo_is_bounded_or_rejected() {
        let compressor = ImageCompressor::new(CompressionConfig::default()).expect("compressor");
        // A high-quality camera JPEG of noisy pixels lands well above 5 MB.
        let jpeg = encode_jpeg(&noise(4000, 3000), 95).expect("encode fixture");
        let source = raw(jpeg, 4000, 3000);
        assert!(source.declared_size >= 5_000_000, "fixture is {} bytes", source.declared_size);

        match compressor.compress(&source) {
            Ok(image) => {
                assert!(image.width <= 600 && image.height <= 600);
                assert!(image.encoded_size <= 35 * 1024);
                assert!(image.quality >= 0.2);
            }
            Err(TreasureError::ImageTooLarge { smallest, budget }) => assert!(smallest > budget),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn noisy_photo_with_tiny_budget_fails_explicitly() {
        let config = CompressionConfig {
            size_budget_bytes: 2_000,
            ..Default::default()
        };
        let compressor = ImageCompressor::new(config).expect("compressor");
        let source = raw(encoded(noise(300, 300), ImageFormat::Png), 300, 300);

        let err = compressor.compress(&source).unwrap_err();
        assert!(matches!(err, TreasureError::ImageTooLarge { smallest, .. } if smallest > 2_000));
    }

    #[test]
    fn quality_maps_onto_percent_scale() {
        assert_eq!(quality_percent(0.6), 60);
        assert_eq!(quality_percent(0.21), 21);
        assert_eq!(quality_percent(0.001), 1);
        assert_eq!(quality_percent(1.0), 100);
    }

    #[test]
    fn base64_length_matches_engine() {
        for len in [0usize, 1, 2, 3, 4, 35_000] {
            assert_eq!(base64_len(len), STANDARD.encode(vec![0u8; len]).len());
        }
    }
}
