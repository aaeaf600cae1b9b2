// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic contracts for the device capabilities a report needs.

use async_trait::async_trait;
use treasure_core::error::{GeolocationError, Result};
use treasure_core::types::{Coordinates, RawImage};

/// Everything the report form asks of the device.
pub trait PlatformBridge: CoordinateProvider + PhotoSource {
    /// Human-readable platform name (e.g. "iOS 17", "Desktop").
    fn platform_name(&self) -> &str;
}

/// Resolves the device's current position.
///
/// One call is one request. Callers never retry on their own; a retry is a
/// new call the user asked for.
#[async_trait]
pub trait CoordinateProvider: Send + Sync {
    async fn current_position(&self) -> std::result::Result<Coordinates, GeolocationError>;
}

/// Produces a photo for the report.
pub trait PhotoSource: Send + Sync {
    /// Capture or pick one photo. Returns Ok(None) if the user cancelled.
    fn capture_photo(&self) -> Result<Option<RawImage>>;
}
