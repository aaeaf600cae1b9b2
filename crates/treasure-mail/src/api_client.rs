// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Relay transport: POSTs the report as JSON to a server that composes and
// sends the email on our behalf.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, instrument};
use treasure_core::error::{Result, TreasureError};
use treasure_core::types::{Delivery, TreasureReport};

use crate::payload::{ApiPayload, ApiResponse};
use crate::transport::{EmailTransport, http_client};

/// HTTP client for the relay's `send-treasure` endpoint.
pub struct ApiTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ApiTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl EmailTransport for ApiTransport {
    fn name(&self) -> &'static str {
        "api"
    }

    #[instrument(skip(self, report), fields(endpoint = %self.endpoint, report_id = %report.id))]
    async fn send(&self, report: &TreasureReport) -> Result<Delivery> {
        let payload = ApiPayload::from_report(report);
        debug!(
            has_image = payload.image.is_some(),
            has_coordinates = payload.coordinates.is_some(),
            "posting report to relay"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TreasureError::Transport(format!("could not reach the email service: {e}")))?;

        let status = response.status();
        let body: ApiResponse = response.json().await.map_err(|e| {
            TreasureError::Transport(format!("unexpected reply from the email service (HTTP {status}): {e}"))
        })?;

        if !(status.is_success() && body.success) {
            let message = body.failure_message();
            error!(%status, %message, "relay rejected report");
            return Err(TreasureError::Transport(message));
        }

        let provider_id = body.provider_id();
        info!(provider_id = provider_id.as_deref().unwrap_or("-"), "report delivered via relay");
        Ok(Delivery {
            report_id: report.id,
            recipient: report.recipient.clone(),
            transport: self.name().into(),
            provider_id,
            sent_at: Utc::now(),
        })
    }
}
