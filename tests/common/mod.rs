// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use pairlist::config::Config;
use pairlist::db::{FirestoreDb, MemoryStore};
use pairlist::error::AppError;
use pairlist::routes::create_router;
use pairlist::services::{ExternalIdentity, ExternalIdentityProvider};
use pairlist::AppState;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// External identity provider answering from a fixed table of session ids.
#[derive(Default)]
pub struct StaticIdentityProvider {
    identities: HashMap<String, ExternalIdentity>,
}

#[allow(dead_code)]
impl StaticIdentityProvider {
    pub fn with(mut self, session_id: &str, email: &str, name: &str, token: &str) -> Self {
        self.identities.insert(
            session_id.to_string(),
            ExternalIdentity {
                id: Some(format!("ext-{}", session_id)),
                email: email.to_string(),
                name: name.to_string(),
                picture: Some("https://example.com/p.png".to_string()),
                session_token: token.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl ExternalIdentityProvider for StaticIdentityProvider {
    async fn exchange(&self, session_id: &str) -> Result<ExternalIdentity, AppError> {
        self.identities
            .get(session_id)
            .cloned()
            .ok_or(AppError::ExternalAuthRejected)
    }
}

/// Create a test app on the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(StaticIdentityProvider::default())
}

#[allow(dead_code)]
pub fn create_test_app_with(provider: StaticIdentityProvider) -> (Router, Arc<AppState>) {
    let state = Arc::new(
        AppState::new(
            Config::test_default(),
            Arc::new(MemoryStore::new()),
            Arc::new(provider),
        )
        .expect("Failed to build app state"),
    );

    (create_router(state.clone()), state)
}

/// Send a request, optionally with a JSON body and bearer token.
/// Returns the status and the parsed body (`Value::Null` when empty).
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Send the same POST once per token, each from its own task, all released
/// together by a barrier. Results are in token order.
#[allow(dead_code)]
pub async fn send_concurrently(
    app: &Router,
    uri: &str,
    tokens: &[String],
    body: Value,
) -> Vec<(StatusCode, Value)> {
    let barrier = Arc::new(tokio::sync::Barrier::new(tokens.len()));

    let handles: Vec<_> = tokens
        .iter()
        .cloned()
        .map(|token| {
            let app = app.clone();
            let uri = uri.to_string();
            let body = body.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                send(&app, "POST", &uri, Some(token.as_str()), Some(body)).await
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

/// Register a user and return `(session_token, user_json)`.
#[allow(dead_code)]
pub async fn register(app: &Router, email: &str, name: &str) -> (String, Value) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "hunter2-long-enough",
            "name": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);

    let token = body["session_token"].as_str().unwrap().to_string();
    (token, body["user"].clone())
}

/// Register two users and pair them. Returns their tokens and profiles.
#[allow(dead_code)]
pub async fn register_pair(app: &Router) -> ((String, Value), (String, Value)) {
    let a = register(app, "a@x.com", "A").await;
    let b = register(app, "b@x.com", "B").await;

    let (status, body) = send(
        app,
        "POST",
        "/api/connect-friend",
        Some(a.0.as_str()),
        Some(serde_json::json!({ "friend_code": b.1["friend_code"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "pairing failed: {}", body);

    (a, b)
}
