// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Session expired")]
    SessionExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    EmailTaken,

    /// Same message for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please use external sign-in for this account")]
    OAuthOnlyAccount,

    #[error("You already have a partner")]
    AlreadyPaired,

    #[error("Friend code not found")]
    FriendCodeNotFound,

    #[error("Cannot connect with yourself")]
    SelfPairing,

    #[error("This user already has a partner")]
    TargetAlreadyPaired,

    #[error("You need a partner to create bucket list items")]
    NoPartner,

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid session ID")]
    ExternalAuthRejected,

    #[error("Could not allocate a unique friend code")]
    CodeSpaceExhausted,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("External auth error: {0}")]
    ExternalAuth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status and stable machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AppError::SessionExpired => (StatusCode::UNAUTHORIZED, "session_expired"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
            AppError::EmailTaken => (StatusCode::BAD_REQUEST, "email_taken"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AppError::OAuthOnlyAccount => (StatusCode::UNAUTHORIZED, "oauth_only_account"),
            AppError::AlreadyPaired => (StatusCode::BAD_REQUEST, "already_paired"),
            AppError::FriendCodeNotFound => (StatusCode::NOT_FOUND, "friend_code_not_found"),
            AppError::SelfPairing => (StatusCode::BAD_REQUEST, "self_pairing"),
            AppError::TargetAlreadyPaired => (StatusCode::BAD_REQUEST, "target_already_paired"),
            AppError::NoPartner => (StatusCode::BAD_REQUEST, "no_partner"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::ExternalAuthRejected => {
                (StatusCode::UNAUTHORIZED, "external_auth_rejected")
            }
            AppError::CodeSpaceExhausted => {
                (StatusCode::SERVICE_UNAVAILABLE, "code_space_exhausted")
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::ExternalAuth(_) => (StatusCode::BAD_GATEWAY, "external_auth_error"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();

        let details = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
            AppError::ExternalAuth(msg) => {
                tracing::warn!(error = %msg, "External auth exchange failed");
                None
            }
            other => Some(other.to_string()),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
