// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The delivery capability the submission controller depends on, and the
// startup-time choice between its two implementations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use treasure_core::config::{AppConfig, TransportConfig};
use treasure_core::error::{Result, TreasureError};
use treasure_core::types::{Delivery, TreasureReport};

use crate::api_client::ApiTransport;
use crate::widget_client::WidgetTransport;

/// Delivers a report as an email.
///
/// Implementations never retry on their own; every failure is final for that
/// attempt and comes back as `TreasureError::Transport`.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Short name for logs and receipts.
    fn name(&self) -> &'static str;

    async fn send(&self, report: &TreasureReport) -> Result<Delivery>;
}

/// Build the transport selected in `config`.
pub fn build_transport(config: &AppConfig) -> Result<Arc<dyn EmailTransport>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let transport: Arc<dyn EmailTransport> = match &config.transport {
        TransportConfig::Api { endpoint } => Arc::new(ApiTransport::new(endpoint.clone(), timeout)?),
        TransportConfig::Widget { .. } => Arc::new(WidgetTransport::from_config(config)?),
    };
    info!(transport = transport.name(), "email transport ready");
    Ok(transport)
}

/// Shared HTTP client construction.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TreasureError::Config(format!("HTTP client: {e}")))
}
