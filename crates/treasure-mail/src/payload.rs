// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire shapes for both delivery paths.
//
// The relay path carries a JSON document; the widget path carries a flat
// string template. Both render coordinates with exactly six decimals.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use treasure_core::error::GENERIC_TRANSPORT_FAILURE;
use treasure_core::types::{TreasureReport, format_coordinate};

/// Shown in the widget template wherever a value is missing.
pub const NOT_AVAILABLE: &str = "N/A";

/// 1x1 PNG sent in the widget's image slot when the report has no photo.
pub const PLACEHOLDER_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Coordinates as they appear in the relay JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApiCoordinates {
    #[serde(serialize_with = "six_decimals")]
    pub latitude: f64,
    #[serde(serialize_with = "six_decimals")]
    pub longitude: f64,
}

/// Request body of `POST /api/send-treasure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiPayload {
    pub email: String,
    #[serde(default)]
    pub description: String,
    pub coordinates: Option<ApiCoordinates>,
    /// `data:<mime>;base64,<payload>`
    pub image: Option<String>,
}

impl ApiPayload {
    pub fn from_report(report: &TreasureReport) -> Self {
        Self {
            email: report.recipient.clone(),
            description: report.description.clone(),
            coordinates: report.coordinates.map(|c| ApiCoordinates {
                latitude: c.latitude,
                longitude: c.longitude,
            }),
            image: report.image.as_ref().map(|img| img.data_uri()),
        }
    }
}

/// Response body of the relay, for both outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }

    pub fn failed(details: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(GENERIC_TRANSPORT_FAILURE.into()),
            details: Some(details.into()),
        }
    }

    /// Best message available for the user, falling back to a generic one.
    pub fn failure_message(&self) -> String {
        match (self.error.as_deref(), self.details.as_deref()) {
            (Some(error), Some(details)) if !details.is_empty() => format!("{error}: {details}"),
            (Some(error), _) => error.to_owned(),
            (None, Some(details)) => details.to_owned(),
            (None, None) => GENERIC_TRANSPORT_FAILURE.to_owned(),
        }
    }

    /// Message id the mail provider assigned, wherever it put it.
    pub fn provider_id(&self) -> Option<String> {
        let data = self.data.as_ref()?;
        data.pointer("/id")
            .or_else(|| data.pointer("/data/id"))
            .and_then(|v| v.as_str())
            .map(str::to_owned)
    }
}

/// Flat template parameters for the widget service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetParams {
    pub to_email: String,
    pub description: String,
    pub latitude: String,
    pub longitude: String,
    pub map_link: String,
    pub image: String,
}

impl WidgetParams {
    pub fn from_report(report: &TreasureReport, map_base_url: &str) -> Self {
        let (latitude, longitude, map_link) = match report.coordinates {
            Some(c) => (c.latitude_text(), c.longitude_text(), c.map_link(map_base_url)),
            None => (
                NOT_AVAILABLE.to_owned(),
                NOT_AVAILABLE.to_owned(),
                NOT_AVAILABLE.to_owned(),
            ),
        };
        Self {
            to_email: report.recipient.clone(),
            description: report.description.clone(),
            latitude,
            longitude,
            map_link,
            image: report
                .image
                .as_ref()
                .map(|img| img.data_uri())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned()),
        }
    }

    /// Combined size of every field, which the widget service caps.
    pub fn payload_size(&self) -> usize {
        [
            &self.to_email,
            &self.description,
            &self.latitude,
            &self.longitude,
            &self.map_link,
            &self.image,
        ]
        .iter()
        .map(|field| field.len())
        .sum()
    }
}

/// Write an `f64` as a JSON number with exactly six decimals.
fn six_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let raw = RawValue::from_string(format_coordinate(*value)).map_err(serde::ser::Error::custom)?;
    raw.serialize(serializer)
}
