// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop stand-ins: a position given up front and photos read from disk.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument};
use treasure_core::error::{GeolocationError, Result};
use treasure_core::types::{Coordinates, RawImage};

use crate::traits::{CoordinateProvider, PhotoSource};

/// Always answers with the same position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition {
    coordinates: Coordinates,
}

impl FixedPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates::new(latitude, longitude),
        }
    }

    pub fn with_accuracy(mut self, metres: f64) -> Self {
        self.coordinates.accuracy = Some(metres);
        self
    }
}

#[async_trait]
impl CoordinateProvider for FixedPosition {
    async fn current_position(&self) -> std::result::Result<Coordinates, GeolocationError> {
        Ok(self.coordinates)
    }
}

/// Reads the photo from a file on every capture.
#[derive(Debug, Clone)]
pub struct FilePhotoSource {
    path: PathBuf,
}

impl FilePhotoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PhotoSource for FilePhotoSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn capture_photo(&self) -> Result<Option<RawImage>> {
        let bytes = std::fs::read(&self.path)?;
        let raw = treasure_image::probe(bytes)?;
        debug!(width = raw.width, height = raw.height, size = raw.declared_size, "photo read");
        Ok(Some(raw))
    }
}
