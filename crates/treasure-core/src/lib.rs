// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Treasure Log: core types, report assembly, and error definitions shared
// across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod report;
pub mod types;

pub use config::{AppConfig, RelayConfig, Secret, TransportConfig};
pub use error::{GeolocationError, TreasureError, ValidationError};
pub use report::ReportBuilder;
pub use types::*;
