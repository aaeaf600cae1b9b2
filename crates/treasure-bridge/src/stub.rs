// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for builds with no location or camera hardware.

use async_trait::async_trait;
use treasure_core::error::{GeolocationError, Result, TreasureError};
use treasure_core::types::{Coordinates, RawImage};

use crate::traits::*;

/// Bridge with no capabilities. Location reports `Unavailable`; the camera
/// reports `PlatformUnavailable`.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

#[async_trait]
impl CoordinateProvider for StubBridge {
    async fn current_position(&self) -> std::result::Result<Coordinates, GeolocationError> {
        tracing::warn!("CoordinateProvider::current_position called on stub bridge");
        Err(GeolocationError::Unavailable)
    }
}

impl PhotoSource for StubBridge {
    fn capture_photo(&self) -> Result<Option<RawImage>> {
        tracing::warn!("PhotoSource::capture_photo called on stub bridge");
        Err(TreasureError::PlatformUnavailable("camera"))
    }
}
