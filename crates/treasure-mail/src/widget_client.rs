// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Widget transport: hands flat template parameters to a hosted email
// widget service (EmailJS-style REST endpoint).
//
// The service caps the combined size of all template variables. That cap is
// why the compressor has a byte budget at all, and it is checked here again
// before anything leaves the process.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use treasure_core::config::{AppConfig, Secret, TransportConfig};
use treasure_core::error::{GENERIC_TRANSPORT_FAILURE, Result, TreasureError};
use treasure_core::types::{Delivery, TreasureReport};

use crate::payload::WidgetParams;
use crate::transport::{EmailTransport, http_client};

/// Combined ceiling across all template variables.
pub const WIDGET_PAYLOAD_LIMIT_BYTES: usize = 50 * 1024;

/// Body the widget service expects.
#[derive(Serialize)]
struct WidgetRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a WidgetParams,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
}

/// Client for the widget service.
pub struct WidgetTransport {
    client: reqwest::Client,
    endpoint: String,
    service_id: String,
    template_id: String,
    public_key: Secret,
    access_token: Option<Secret>,
    map_base_url: String,
    payload_limit: usize,
}

impl WidgetTransport {
    /// Build from an `AppConfig` whose transport is `Widget`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let TransportConfig::Widget {
            endpoint,
            service_id,
            template_id,
            public_key,
            access_token,
        } = &config.transport
        else {
            return Err(TreasureError::Config("transport is not configured as a widget".into()));
        };

        Ok(Self {
            client: http_client(Duration::from_secs(config.request_timeout_secs))?,
            endpoint: endpoint.clone(),
            service_id: service_id.clone(),
            template_id: template_id.clone(),
            public_key: public_key.clone(),
            access_token: access_token.clone(),
            map_base_url: config.map_base_url.clone(),
            payload_limit: WIDGET_PAYLOAD_LIMIT_BYTES,
        })
    }

    /// Override the combined-size ceiling (for services with other limits).
    pub fn with_payload_limit(mut self, limit: usize) -> Self {
        self.payload_limit = limit;
        self
    }
}

#[async_trait]
impl EmailTransport for WidgetTransport {
    fn name(&self) -> &'static str {
        "widget"
    }

    #[instrument(skip(self, report), fields(service_id = %self.service_id, report_id = %report.id))]
    async fn send(&self, report: &TreasureReport) -> Result<Delivery> {
        let params = WidgetParams::from_report(report, &self.map_base_url);

        let size = params.payload_size();
        if size > self.payload_limit {
            warn!(size, limit = self.payload_limit, "widget payload over limit");
            return Err(TreasureError::Transport(format!(
                "report is too large for the email widget ({size} bytes, limit {})",
                self.payload_limit
            )));
        }

        let request = WidgetRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: self.public_key.expose(),
            template_params: &params,
            access_token: self.access_token.as_ref().map(Secret::expose),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| TreasureError::Transport(format!("could not reach the email widget: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // The service answers errors with a plain-text reason.
            let reason = response.text().await.unwrap_or_default();
            let reason = reason.trim();
            error!(%status, reason, "widget rejected report");
            return Err(TreasureError::Transport(if reason.is_empty() {
                GENERIC_TRANSPORT_FAILURE.to_owned()
            } else {
                reason.to_owned()
            }));
        }

        info!(size, "report delivered via widget");
        Ok(Delivery {
            report_id: report.id,
            recipient: report.recipient.clone(),
            transport: self.name().into(),
            provider_id: None,
            sent_at: Utc::now(),
        })
    }
}
