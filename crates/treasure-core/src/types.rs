// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Treasure Log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TreasureError};

/// Unique identifier for a submitted report (log correlation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An image exactly as the user selected it, before any processing.
#[derive(Clone, PartialEq, Eq)]
pub struct RawImage {
    /// Encoded file bytes (JPEG, PNG, HEIF-converted JPEG, ...).
    pub bytes: Vec<u8>,
    /// Natural width in pixels, as read from the file header.
    pub width: u32,
    /// Natural height in pixels, as read from the file header.
    pub height: u32,
    /// File size reported by the picker.
    pub declared_size: u64,
}

impl std::fmt::Debug for RawImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawImage")
            .field("bytes", &self.bytes.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("declared_size", &self.declared_size)
            .finish()
    }
}

/// MIME type of every image the compressor produces.
pub const COMPRESSED_MIME: &str = "image/jpeg";

/// A size-bounded JPEG, carried as base64 text.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedImage {
    /// Base64 (standard alphabet, padded) of the JPEG stream.
    pub data: String,
    pub width: u32,
    pub height: u32,
    /// Length of `data` in bytes, always within the configured budget.
    pub encoded_size: usize,
    /// Quality factor in (0, 1] the JPEG was encoded with.
    pub quality: f64,
}

impl CompressedImage {
    /// `data:image/jpeg;base64,...` form used by both transports.
    pub fn data_uri(&self) -> String {
        format!("data:{COMPRESSED_MIME};base64,{}", self.data)
    }
}

impl std::fmt::Debug for CompressedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("encoded_size", &self.encoded_size)
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}

/// A position fix from the coordinate provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in metres, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    /// Latitude with exactly six decimal digits.
    pub fn latitude_text(&self) -> String {
        format_coordinate(self.latitude)
    }

    /// Longitude with exactly six decimal digits.
    pub fn longitude_text(&self) -> String {
        format_coordinate(self.longitude)
    }

    /// `<base>?q=<lat>,<lon>` with both values at six decimals.
    pub fn map_link(&self, base_url: &str) -> String {
        format!(
            "{base_url}?q={},{}",
            self.latitude_text(),
            self.longitude_text()
        )
    }
}

/// Render a coordinate the way every payload shows it: six decimals.
pub fn format_coordinate(value: f64) -> String {
    format!("{value:.6}")
}

/// Knobs for the adaptive compressor.
///
/// `size_budget_bytes` comes from the transport's payload ceiling and must be
/// configured per transport rather than assumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// Hard ceiling on [`CompressedImage::encoded_size`].
    pub size_budget_bytes: usize,
    pub initial_quality: f64,
    pub quality_step: f64,
    pub min_quality: f64,
    /// Maximum number of quality decrements after the first encode.
    pub max_attempts: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_width: 600,
            max_height: 600,
            size_budget_bytes: 35 * 1024,
            initial_quality: 0.6,
            quality_step: 0.03,
            min_quality: 0.2,
            max_attempts: 15,
        }
    }
}

impl CompressionConfig {
    /// Reject settings that would make the quality search meaningless.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(TreasureError::Config(format!("compression: {msg}")));

        if self.max_width == 0 || self.max_height == 0 {
            return invalid("max_width and max_height must be non-zero");
        }
        if self.size_budget_bytes == 0 {
            return invalid("size_budget_bytes must be non-zero");
        }
        if !(self.initial_quality > 0.0 && self.initial_quality <= 1.0) {
            return invalid("initial_quality must be in (0, 1]");
        }
        if !(self.min_quality > 0.0 && self.min_quality <= self.initial_quality) {
            return invalid("min_quality must be in (0, initial_quality]");
        }
        if !(self.quality_step > 0.0) {
            return invalid("quality_step must be positive");
        }
        Ok(())
    }
}

/// The bundle handed to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TreasureReport {
    pub id: ReportId,
    /// Trimmed, syntactically checked recipient address.
    pub recipient: String,
    /// May be empty.
    pub description: String,
    pub coordinates: Option<Coordinates>,
    pub image: Option<CompressedImage>,
}

impl TreasureReport {
    /// Whether any of description, coordinates, or image is present.
    pub fn has_content(&self) -> bool {
        !self.description.is_empty() || self.coordinates.is_some() || self.image.is_some()
    }
}

/// Everything the user has entered so far. Cleared after a successful send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub image: Option<CompressedImage>,
    pub coordinates: Option<Coordinates>,
    pub description: String,
    pub email: String,
}

impl FormState {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Lifecycle of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Dispatching,
    /// Delivered; carries the recipient address.
    Succeeded(String),
    /// Carries the message shown to the user.
    Failed(String),
}

impl SubmissionState {
    /// True while a send is in flight; the submit control must be disabled.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Dispatching)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }
}

/// Receipt returned by a transport after a successful send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub report_id: ReportId,
    pub recipient: String,
    /// Short transport name, e.g. "api" or "widget".
    pub transport: String,
    /// Message id assigned by the downstream provider, if any.
    pub provider_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_render_with_six_decimals() {
        let coords = Coordinates::new(37.422, -122.084);
        assert_eq!(coords.latitude_text(), "37.422000");
        assert_eq!(coords.longitude_text(), "-122.084000");
    }

    #[test]
    fn map_link_uses_formatted_values() {
        let coords = Coordinates::new(37.422, -122.084);
        assert_eq!(
            coords.map_link("https://maps.example/"),
            "https://maps.example/?q=37.422000,-122.084000"
        );
    }

    #[test]
    fn data_uri_prefix() {
        let img = CompressedImage {
            data: "QUJD".into(),
            width: 1,
            height: 1,
            encoded_size: 4,
            quality: 0.6,
        };
        assert_eq!(img.data_uri(), "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn default_compression_config_is_valid() {
        assert!(CompressionConfig::default().validate().is_ok());
    }

    #[test]
    fn compression_config_rejects_bad_quality() {
        let config = CompressionConfig {
            min_quality: 0.8,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TreasureError::Config(_))));

        let config = CompressionConfig {
            quality_step: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn busy_only_while_in_flight() {
        assert!(SubmissionState::Dispatching.is_busy());
        assert!(SubmissionState::Validating.is_busy());
        assert!(!SubmissionState::Idle.is_busy());
        assert!(!SubmissionState::Failed("empty report".into()).is_busy());
    }

    #[test]
    fn filled_form_is_not_empty() {
        let form = FormState {
            description: "gold coin".into(),
            email: "a@b.co".into(),
            coordinates: Some(Coordinates::new(1.0, 2.0)),
            image: None,
        };
        assert!(!form.is_empty());
        assert!(FormState::default().is_empty());
    }
}
