// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Partner pairing through friend codes.

use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{create_test_app, register, register_pair, send, send_concurrently};

#[tokio::test]
async fn test_pairing_is_symmetric() {
    let (app, _) = create_test_app();
    let (a_token, a) = register(&app, "a@x.com", "A").await;
    let (b_token, b) = register(&app, "b@x.com", "B").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/connect-friend",
        Some(a_token.as_str()),
        Some(json!({ "friend_code": b["friend_code"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Connected successfully");
    assert_eq!(body["partner"]["user_id"], b["user_id"]);
    assert_eq!(body["partner"]["partner_id"], a["user_id"]);

    let (_, me_a) = send(&app, "GET", "/api/auth/me", Some(a_token.as_str()), None).await;
    let (_, me_b) = send(&app, "GET", "/api/auth/me", Some(b_token.as_str()), None).await;
    assert_eq!(me_a["partner_id"], b["user_id"]);
    assert_eq!(me_b["partner_id"], a["user_id"]);
}

#[tokio::test]
async fn test_friend_code_is_case_insensitive() {
    let (app, _) = create_test_app();
    let (a_token, _) = register(&app, "a@x.com", "A").await;
    let (_, b) = register(&app, "b@x.com", "B").await;
    let code = format!(" {} ", b["friend_code"].as_str().unwrap().to_lowercase());

    let (status, _) = send(
        &app,
        "POST",
        "/api/connect-friend",
        Some(a_token.as_str()),
        Some(json!({ "friend_code": code })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_friend_code() {
    let (app, _) = create_test_app();
    let (a_token, a) = register(&app, "a@x.com", "A").await;
    // Codes are 5 characters; a 6-character code never matches.
    let (status, body) = send(
        &app,
        "POST",
        "/api/connect-friend",
        Some(a_token.as_str()),
        Some(json!({ "friend_code": "ZZZZZZ" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "friend_code_not_found");

    let (_, me) = send(&app, "GET", "/api/auth/me", Some(a_token.as_str()), None).await;
    assert_eq!(me["partner_id"], a["partner_id"]);
}

#[tokio::test]
async fn test_self_pairing_rejected() {
    let (app, _) = create_test_app();
    let (a_token, a) = register(&app, "a@x.com", "A").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/connect-friend",
        Some(a_token.as_str()),
        Some(json!({ "friend_code": a["friend_code"] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "self_pairing");
}

#[tokio::test]
async fn test_already_paired_requester_rejected() {
    let (app, _) = create_test_app();
    let ((a_token, _), _) = register_pair(&app).await;
    let (_, c) = register(&app, "c@x.com", "C").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/connect-friend",
        Some(a_token.as_str()),
        Some(json!({ "friend_code": c["friend_code"] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "already_paired");
}

#[tokio::test]
async fn test_paired_target_rejected() {
    let (app, _) = create_test_app();
    let (_, (_, b)) = register_pair(&app).await;
    let (c_token, c) = register(&app, "c@x.com", "C").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/connect-friend",
        Some(c_token.as_str()),
        Some(json!({ "friend_code": b["friend_code"] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "target_already_paired");

    let (_, me) = send(&app, "GET", "/api/auth/me", Some(c_token.as_str()), None).await;
    assert_eq!(me["partner_id"], c["partner_id"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pairing_with_same_target() {
    let (app, _) = create_test_app();
    let (_, b) = register(&app, "b@x.com", "B").await;
    let (a_token, _) = register(&app, "a@x.com", "A").await;
    let (c_token, _) = register(&app, "c@x.com", "C").await;
    let body = json!({ "friend_code": b["friend_code"] });

    let results = send_concurrently(&app, "/api/connect-friend", &[a_token, c_token], body).await;

    let (winners, losers): (Vec<_>, Vec<_>) =
        results.into_iter().partition(|(s, _)| *s == StatusCode::OK);
    assert_eq!(winners.len(), 1, "exactly one requester may win B");
    assert_eq!(losers[0].0, StatusCode::BAD_REQUEST);
    assert_eq!(losers[0].1["error"], "target_already_paired");

    assert_eq!(winners[0].1["partner"]["user_id"], b["user_id"]);
}

#[tokio::test]
async fn test_connect_requires_auth() {
    let (app, _) = create_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/connect-friend",
        None,
        Some(json!({ "friend_code": "ABCDE" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
