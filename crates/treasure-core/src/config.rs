// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Built once at process start and passed down by reference. Nothing below the
// binary reads the process environment itself.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TreasureError};
use crate::types::CompressionConfig;

/// Map link base used when none is configured.
pub const DEFAULT_MAP_BASE_URL: &str = "https://www.google.com/maps";

/// Credential or key that must never appear in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Which delivery path reports take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    /// POST the report JSON to a relay that sends the email server-side.
    Api { endpoint: String },
    /// Hand flat template parameters to a third-party email widget service.
    Widget {
        endpoint: String,
        service_id: String,
        template_id: String,
        public_key: Secret,
        access_token: Option<Secret>,
    },
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Api {
            endpoint: "http://127.0.0.1:3000/api/send-treasure".into(),
        }
    }
}

/// Client-side settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub transport: TransportConfig,
    pub compression: CompressionConfig,
    /// Prefix for map links; `?q=<lat>,<lon>` is appended.
    pub map_base_url: String,
    /// Upper bound on a single transport request.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            compression: CompressionConfig::default(),
            map_base_url: DEFAULT_MAP_BASE_URL.into(),
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        let transport_kind = lookup("TREASURE_TRANSPORT").unwrap_or_else(|| "api".into());
        config.transport = match transport_kind.to_ascii_lowercase().as_str() {
            "api" => TransportConfig::Api {
                endpoint: lookup("TREASURE_API_ENDPOINT")
                    .unwrap_or_else(|| "http://127.0.0.1:3000/api/send-treasure".into()),
            },
            "widget" => TransportConfig::Widget {
                endpoint: lookup("TREASURE_WIDGET_ENDPOINT")
                    .unwrap_or_else(|| "https://api.emailjs.com/api/v1.0/email/send".into()),
                service_id: required(&lookup, "TREASURE_WIDGET_SERVICE_ID")?,
                template_id: required(&lookup, "TREASURE_WIDGET_TEMPLATE_ID")?,
                public_key: Secret::new(required(&lookup, "TREASURE_WIDGET_PUBLIC_KEY")?),
                access_token: lookup("TREASURE_WIDGET_ACCESS_TOKEN").map(Secret::new),
            },
            other => {
                return Err(TreasureError::Config(format!(
                    "TREASURE_TRANSPORT must be 'api' or 'widget', got '{other}'"
                )));
            }
        };

        if let Some(base) = lookup("TREASURE_MAP_BASE_URL") {
            config.map_base_url = base;
        }
        if let Some(v) = parsed(&lookup, "TREASURE_MAX_WIDTH")? {
            config.compression.max_width = v;
        }
        if let Some(v) = parsed(&lookup, "TREASURE_MAX_HEIGHT")? {
            config.compression.max_height = v;
        }
        if let Some(v) = parsed(&lookup, "TREASURE_SIZE_BUDGET")? {
            config.compression.size_budget_bytes = v;
        }
        if let Some(v) = parsed(&lookup, "TREASURE_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout_secs = v;
        }

        config.compression.validate()?;
        Ok(config)
    }
}

/// Server-side settings for the email relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// Mail provider API key.
    pub api_key: Secret,
    /// `From:` header of outgoing mail.
    pub from: String,
    /// Mail provider endpoint that accepts the composed email.
    pub provider_endpoint: String,
    pub map_base_url: String,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            bind: lookup("TREASURE_RELAY_BIND").unwrap_or_else(|| "127.0.0.1:3000".into()),
            api_key: Secret::new(required(&lookup, "RESEND_API_KEY")?),
            from: lookup("TREASURE_MAIL_FROM")
                .unwrap_or_else(|| "Treasure Finder <onboarding@resend.dev>".into()),
            provider_endpoint: lookup("TREASURE_RESEND_ENDPOINT")
                .unwrap_or_else(|| "https://api.resend.com/emails".into()),
            map_base_url: lookup("TREASURE_MAP_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MAP_BASE_URL.into()),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| TreasureError::Config(format!("{key} is not set")))
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| TreasureError::Config(format!("{key}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_api_defaults() {
        let config = AppConfig::from_env_with(env(&[])).expect("defaults");
        assert_eq!(config, AppConfig::default());
        assert!(matches!(config.transport, TransportConfig::Api { .. }));
    }

    #[test]
    fn widget_requires_credentials() {
        let result = AppConfig::from_env_with(env(&[("TREASURE_TRANSPORT", "widget")]));
        assert!(matches!(result, Err(TreasureError::Config(msg)) if msg.contains("SERVICE_ID")));
    }

    #[test]
    fn widget_config_from_env() {
        let config = AppConfig::from_env_with(env(&[
            ("TREASURE_TRANSPORT", "widget"),
            ("TREASURE_WIDGET_SERVICE_ID", "service_1"),
            ("TREASURE_WIDGET_TEMPLATE_ID", "template_1"),
            ("TREASURE_WIDGET_PUBLIC_KEY", "pk_live"),
        ]))
        .expect("widget config");
        match config.transport {
            TransportConfig::Widget {
                service_id,
                public_key,
                access_token,
                ..
            } => {
                assert_eq!(service_id, "service_1");
                assert_eq!(public_key.expose(), "pk_live");
                assert!(access_token.is_none());
            }
            other => panic!("expected widget transport, got {other:?}"),
        }
    }

    #[test]
    fn numeric_overrides_are_parsed() {
        let config = AppConfig::from_env_with(env(&[
            ("TREASURE_SIZE_BUDGET", "20480"),
            ("TREASURE_MAX_WIDTH", "800"),
        ]))
        .expect("config");
        assert_eq!(config.compression.size_budget_bytes, 20480);
        assert_eq!(config.compression.max_width, 800);
    }

    #[test]
    fn bad_number_is_a_config_error() {
        let result = AppConfig::from_env_with(env(&[("TREASURE_SIZE_BUDGET", "lots")]));
        assert!(matches!(result, Err(TreasureError::Config(_))));
    }

    #[test]
    fn unknown_transport_rejected() {
        let result = AppConfig::from_env_with(env(&[("TREASURE_TRANSPORT", "pigeon")]));
        assert!(result.is_err());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = Secret::new("re_123456");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
    }

    #[test]
    fn relay_requires_api_key() {
        assert!(RelayConfig::from_env_with(env(&[])).is_err());
        let relay = RelayConfig::from_env_with(env(&[("RESEND_API_KEY", "re_key")]))
            .expect("relay config");
        assert_eq!(relay.bind, "127.0.0.1:3000");
        assert_eq!(relay.api_key.expose(), "re_key");
    }
}
