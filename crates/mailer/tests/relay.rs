use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
use mailer::{MailError, Mailer, verification_email};
use serde_json::Value;

#[derive(Clone, Default)]
struct Inbox {
    messages: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn accept(
    State(inbox): State<Inbox>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    inbox.messages.lock().unwrap().push((auth, body));
    StatusCode::ACCEPTED
}

async fn reject() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "upstream down")
}

async fn spawn_relay() -> (String, Inbox) {
    let inbox = Inbox::default();
    let app = Router::new()
        .route("/send", post(accept))
        .route("/broken", post(reject))
        .with_state(inbox.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), inbox)
}

#[tokio::test]
async fn relay_posts_json_with_bearer_token() {
    let (base, inbox) = spawn_relay().await;
    let mailer = Mailer::relay(
        reqwest::Client::new(),
        format!("{base}/send"),
        "noreply@ledgerly.test",
        Some("secret".to_string()),
    );

    let email = verification_email("a@example.com", "https://site/verify?token=abc");
    mailer.send_verification_email(&email).await.unwrap();

    let messages = inbox.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    let (auth, body) = &messages[0];
    assert_eq!(auth.as_deref(), Some("Bearer secret"));
    assert_eq!(body["from"], "noreply@ledgerly.test");
    assert_eq!(body["to"], "a@example.com");
    assert_eq!(body["subject"], email.subject);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn relay_failures_propagate() {
    let (base, _inbox) = spawn_relay().await;
    let mailer = Mailer::relay(
        reqwest::Client::new(),
        format!("{base}/broken"),
        "noreply@ledgerly.test",
        None,
    );

    let email = verification_email("a@example.com", "https://site/verify?token=abc");
    let err = mailer.send_verification_email(&email).await.unwrap_err();
    match err {
        MailError::Rejected { status, message } => {
            assert_eq!(status, reqwest::StatusCode::BAD_GATEWAY);
            assert_eq!(message, "upstream down");
        }
        other => panic!("unexpected error: {other}"),
    }
}
