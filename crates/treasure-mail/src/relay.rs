// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Email relay: the server half of the relay transport.
//
// Accepts `POST /api/send-treasure` with an `ApiPayload`, composes an HTML
// email with the photo as an attachment, and hands it to a mail provider.
// Provider credentials live only here, never in the client.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info, instrument, warn};
use treasure_core::config::RelayConfig;
use treasure_core::error::{Result, TreasureError};
use treasure_core::types::{Coordinates, format_coordinate};

use crate::payload::{ApiPayload, ApiResponse};

/// Route the relay transport posts to.
pub const SEND_TREASURE_PATH: &str = "/api/send-treasure";

pub const SUBJECT: &str = "Your Treasure Discovery 🏴‍☠️";

/// A composed email, in the shape the mail provider accepts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Base64 file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub content: String,
}

/// Something that can actually send a composed email.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Returns the provider's response body on success.
    async fn deliver(&self, email: &OutgoingEmail) -> Result<serde_json::Value>;
}

/// Shared state behind the relay routes.
pub struct RelayState {
    provider: Arc<dyn MailProvider>,
    from: String,
    map_base_url: String,
}

impl RelayState {
    pub fn new(provider: Arc<dyn MailProvider>, from: impl Into<String>, map_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            from: from.into(),
            map_base_url: map_base_url.into(),
        }
    }
}

/// Relay routes, ready to be served or nested.
pub fn router(state: RelayState) -> Router {
    Router::new()
        .route(SEND_TREASURE_PATH, post(send_treasure))
        .with_state(Arc::new(state))
}

/// Bind and serve until Ctrl-C / SIGTERM.
pub async fn serve(config: &RelayConfig, provider: Arc<dyn MailProvider>) -> Result<()> {
    let app = router(RelayState::new(provider, config.from.clone(), config.map_base_url.clone()));
    let listener = TcpListener::bind(&config.bind).await?;
    info!(bind = %config.bind, "email relay listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;
    info!("email relay stopped");
    Ok(())
}

#[instrument(skip_all)]
async fn send_treasure(
    State(state): State<Arc<RelayState>>,
    payload: std::result::Result<Json<ApiPayload>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable relay request");
            return (rejection.status(), Json(ApiResponse::failed(rejection.body_text())));
        }
    };

    if request.email.trim().is_empty() {
        warn!("relay request without recipient");
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::failed("missing recipient")),
        );
    }

    let email = match compose_email(&request, &state.from, &state.map_base_url) {
        Ok(email) => email,
        Err(e) => {
            warn!(error = %e, "could not compose email");
            return (StatusCode::BAD_REQUEST, Json(ApiResponse::failed(e.to_string())));
        }
    };

    match state.provider.deliver(&email).await {
        Ok(data) => {
            info!("treasure email sent");
            (StatusCode::OK, Json(ApiResponse::ok(data)))
        }
        Err(e) => {
            error!(error = %e, "email send error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failed(e.to_string())),
            )
        }
    }
}

/// Build the outgoing email for a relay request.
pub fn compose_email(request: &ApiPayload, from: &str, map_base_url: &str) -> Result<OutgoingEmail> {
    let attachments = match request.image.as_deref() {
        Some(uri) => vec![attachment_from_data_uri(uri)?],
        None => Vec::new(),
    };
    let coordinates = request
        .coordinates
        .map(|c| Coordinates::new(c.latitude, c.longitude));

    Ok(OutgoingEmail {
        from: from.to_owned(),
        to: vec![request.email.trim().to_owned()],
        subject: SUBJECT.to_owned(),
        html: render_html(
            &request.description,
            coordinates.as_ref(),
            !attachments.is_empty(),
            map_base_url,
        ),
        attachments,
    })
}

/// Split `data:image/<subtype>;base64,<payload>` into an attachment named
/// `treasure.<subtype>`.
pub fn attachment_from_data_uri(uri: &str) -> Result<Attachment> {
    let malformed = || TreasureError::Decode("image is not a base64 data URI".into());

    let rest = uri.strip_prefix("data:").ok_or_else(malformed)?;
    let (header, content) = rest.split_once(',').ok_or_else(malformed)?;
    let mime = header.strip_suffix(";base64").ok_or_else(malformed)?;
    let (_, subtype) = mime.split_once('/').ok_or_else(malformed)?;
    if subtype.is_empty() || content.is_empty() {
        return Err(malformed());
    }

    Ok(Attachment {
        filename: format!("treasure.{subtype}"),
        content: content.to_owned(),
    })
}

fn render_html(
    description: &str,
    coordinates: Option<&Coordinates>,
    has_image: bool,
    map_base_url: &str,
) -> String {
    let description = if description.trim().is_empty() {
        "No description provided".to_owned()
    } else {
        escape_html(description)
    };
    let (latitude, longitude) = match coordinates {
        Some(c) => (format_coordinate(c.latitude), format_coordinate(c.longitude)),
        None => ("N/A".to_owned(), "N/A".to_owned()),
    };
    let image_note = if has_image {
        r#"<p style="color: #7f8c8d;"><em>See attached image of your treasure!</em></p>"#
    } else {
        ""
    };
    let map_button = match coordinates {
        Some(c) => format!(
            r#"<p style="margin-top: 20px;"><a href="{}" style="display: inline-block; padding: 10px 20px; background-color: #3498db; color: white; text-decoration: none; border-radius: 5px;">View on map</a></p>"#,
            escape_html(&c.map_link(map_base_url))
        ),
        None => String::new(),
    };

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h1 style="color: #2c3e50;">Treasure Found! 🏴‍☠️</h1>
  {image_note}
  <h2 style="color: #34495e;">Description:</h2>
  <p style="color: #2c3e50; line-height: 1.6;">{description}</p>
  <h2 style="color: #34495e;">Location:</h2>
  <p style="color: #2c3e50;"><strong>Latitude:</strong> {latitude}<br/><strong>Longitude:</strong> {longitude}</p>
  {map_button}
</div>"#
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("could not register signal handlers, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
