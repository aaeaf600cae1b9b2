// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resend provider against a fake Resend API on loopback.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use treasure_core::config::Secret;
use treasure_core::error::TreasureError;
use treasure_mail::ResendClient;
use treasure_mail::relay::{Attachment, MailProvider, OutgoingEmail};

#[derive(Debug, Clone)]
struct Seen {
    authorization: Option<String>,
    body: serde_json::Value,
}

type Captured = Arc<Mutex<Vec<Seen>>>;

async fn accept(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    captured.lock().expect("lock").push(Seen { authorization, body });
    Json(json!({ "id": "em_42" }))
}

async fn spawn_service(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/emails")
}

fn client(endpoint: String) -> ResendClient {
    ResendClient::new(endpoint, Secret::new("re_test_key"), Duration::from_secs(5)).expect("client")
}

fn email() -> OutgoingEmail {
    OutgoingEmail {
        from: "Treasure Finder <from@example.com>".into(),
        to: vec!["finder@example.com".into()],
        subject: "Your Treasure Discovery".into(),
        html: "<p>old lantern</p>".into(),
        attachments: vec![Attachment {
            filename: "treasure.jpeg".into(),
            content: "/9j/4AAQ".into(),
        }],
    }
}

#[tokio::test]
async fn accepted_email_returns_provider_body() {
    let captured: Captured = Arc::default();
    let app = Router::new()
        .route("/emails", post(accept))
        .with_state(captured.clone());
    let endpoint = spawn_service(app).await;

    let body = client(endpoint).deliver(&email()).await.expect("deliver");
    assert_eq!(body["id"], "em_42");

    let seen = captured.lock().expect("lock");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer re_test_key"));
    assert_eq!(seen[0].body["to"][0], "finder@example.com");
    assert_eq!(seen[0].body["attachments"][0]["filename"], "treasure.jpeg");
}

#[tokio::test]
async fn rejection_message_is_extracted() {
    let app = Router::new().route(
        "/emails",
        post(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "statusCode": 403, "message": "The example.com domain is not verified" })),
            )
        }),
    );
    let endpoint = spawn_service(app).await;

    match client(endpoint).deliver(&email()).await {
        Err(TreasureError::Transport(message)) => {
            assert_eq!(message, "The example.com domain is not verified")
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_server_error_reports_status() {
    let app = Router::new().route("/emails", post(|| async { StatusCode::BAD_GATEWAY }));
    let endpoint = spawn_service(app).await;

    match client(endpoint).deliver(&email()).await {
        Err(TreasureError::Transport(message)) => {
            assert_eq!(message, "provider returned HTTP 502 Bad Gateway")
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreadable_success_body_still_counts_as_delivered() {
    let app = Router::new().route("/emails", post(|| async { "<html>queued</html>" }));
    let endpoint = spawn_service(app).await;

    let body = client(endpoint).deliver(&email()).await.expect("deliver");
    assert!(body.is_null());
}
