// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resend mail provider used by the relay.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};
use treasure_core::config::{RelayConfig, Secret};
use treasure_core::error::{Result, TreasureError};

use crate::relay::{MailProvider, OutgoingEmail};
use crate::transport::http_client;

pub struct ResendClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Secret,
}

impl ResendClient {
    pub fn new(endpoint: impl Into<String>, api_key: Secret, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &RelayConfig, timeout: Duration) -> Result<Self> {
        Self::new(config.provider_endpoint.clone(), config.api_key.clone(), timeout)
    }
}

#[async_trait]
impl MailProvider for ResendClient {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, attachments = email.attachments.len()))]
    async fn deliver(&self, email: &OutgoingEmail) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(email)
            .send()
            .await
            .map_err(|e| TreasureError::Transport(format!("could not reach mail provider: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TreasureError::Transport(format!("could not read mail provider reply: {e}")))?;
        // The status decides delivery; an unreadable body only loses the id.
        let body = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(body) => body,
            Err(e) => {
                if !text.trim().is_empty() {
                    warn!(%status, error = %e, "mail provider reply is not JSON");
                }
                serde_json::Value::Null
            }
        };

        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_owned)
                .unwrap_or_else(|| format!("provider returned HTTP {status}"));
            error!(%status, %message, "mail provider rejected email");
            return Err(TreasureError::Transport(message));
        }

        debug!(id = body.get("id").and_then(|v| v.as_str()).unwrap_or("-"), "mail provider accepted email");
        Ok(body)
    }
}
