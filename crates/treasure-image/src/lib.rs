// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// treasure-image: Photo preparation for Treasure Log.
//
// Decodes a user-selected photo, fits it to the dimension bounds, and searches
// JPEG quality until the base64 payload fits the transport's byte budget.

pub mod compress;
pub mod processor;

pub use compress::{FrameEncoder, ImageCompressor, JpegFrameEncoder, target_dimensions};
pub use processor::{ImageProcessor, probe};
