// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Treasure Mail: delivers a finished report as an email, either through our
// own relay (JSON over HTTP) or a hosted widget service (flat template
// parameters). The relay server itself lives here too.

pub mod api_client;
pub mod payload;
pub mod relay;
pub mod resend;
pub mod transport;
pub mod widget_client;

pub use api_client::ApiTransport;
pub use payload::{ApiPayload, ApiResponse, WidgetParams};
pub use relay::{MailProvider, OutgoingEmail, RelayState};
pub use resend::ResendClient;
pub use transport::{EmailTransport, build_transport};
pub use widget_client::WidgetTransport;
