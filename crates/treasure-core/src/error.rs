// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Treasure Log.

use thiserror::Error;

/// Top-level error type for all Treasure Log operations.
#[derive(Debug, Error)]
pub enum TreasureError {
    // -- Image errors --
    #[error("could not read image: {0}")]
    Decode(String),

    #[error("image too large: smallest encoding was {smallest} bytes, budget is {budget} bytes")]
    ImageTooLarge { smallest: usize, budget: usize },

    #[error("image encoding failed: {0}")]
    Encode(String),

    // -- Report errors --
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    /// Delivery failed. Carries the transport's own message when it gave one.
    #[error("{0}")]
    Transport(String),

    // -- Setup --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("report session has shut down")]
    SessionClosed,

    #[error("{0} is not available on this platform")]
    PlatformUnavailable(&'static str),
}

/// Reasons a report is refused before it reaches any transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing recipient")]
    MissingRecipient,

    #[error("invalid recipient")]
    InvalidRecipient,

    /// Description, coordinates, and image are all absent.
    #[error("empty report")]
    EmptyReport,
}

/// Failures reported by a coordinate provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location information unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Geolocation is not available on this device")]
    Unavailable,
}

/// Fallback shown when a transport fails without saying why.
pub const GENERIC_TRANSPORT_FAILURE: &str = "Failed to send email";

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TreasureError>;
