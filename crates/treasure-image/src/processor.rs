// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, resample, and JPEG-encode a single in-memory
// image using the `image` crate.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use tracing::{debug, instrument};
use treasure_core::error::{Result, TreasureError};
use treasure_core::types::RawImage;

/// Image processing pipeline operating on a single in-memory image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`, so
/// the decoded pixel buffer has exactly one owner and is freed as soon as the
/// chain ends.
///
/// ```ignore
/// let frame = ImageProcessor::from_bytes(&raw.bytes)?
///     .resize_exact(600, 450, FilterType::CatmullRom)
///     .into_rgb8();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| TreasureError::Decode(err.to_string()))?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Consume the processor and return 8-bit RGB pixels, dropping any alpha.
    pub fn into_rgb8(self) -> RgbImage {
        self.image.into_rgb8()
    }

    // -- Transformations ------------------------------------------------------

    /// Resample to exactly `width` x `height`. A no-op when the size already
    /// matches.
    pub fn resize_exact(self, width: u32, height: u32, filter: FilterType) -> Self {
        if self.image.width() == width && self.image.height() == height {
            return self;
        }
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            to_w = width,
            to_h = height,
            "Resampling image"
        );
        let resized = self.image.resize_exact(width, height, filter);
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        encode_jpeg(&self.image.to_rgb8(), quality)
    }
}

/// Encode RGB pixels as a baseline JPEG at `quality` (1-100).
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    frame
        .write_with_encoder(encoder)
        .map_err(|err| TreasureError::Encode(format!("JPEG encoding failed: {err}")))?;
    Ok(buffer)
}

/// Read the natural dimensions from the file header without decoding pixels.
#[instrument(skip(bytes), fields(data_len = bytes.len()))]
pub fn probe(bytes: Vec<u8>) -> Result<RawImage> {
    let (width, height) = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|err| TreasureError::Decode(err.to_string()))?
        .into_dimensions()
        .map_err(|err| TreasureError::Decode(err.to_string()))?;
    debug!(width, height, "Probed image header");
    Ok(RawImage {
        declared_size: bytes.len() as u64,
        bytes,
        width,
        height,
    })
}
