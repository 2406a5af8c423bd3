// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External identity exchange.
//!
//! A browser sign-in flow run by a third party ends with an opaque session id.
//! Exchanging it returns the user's identity plus a session token that this
//! service then accepts as a bearer token.

use crate::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Header carrying the opaque external session id, both inbound and outbound.
pub const SESSION_ID_HEADER: &str = "x-session-id";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity returned by the external provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalIdentity {
    /// Provider-side user id (informational only)
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    pub session_token: String,
}

#[async_trait]
pub trait ExternalIdentityProvider: Send + Sync {
    /// Exchange an external session id.
    ///
    /// Fails with `ExternalAuthRejected` when the provider does not accept the id
    /// and `ExternalAuth` when the provider cannot be reached or misbehaves.
    async fn exchange(&self, session_id: &str) -> Result<ExternalIdentity, AppError>;
}

/// HTTP client for the external identity endpoint.
#[derive(Clone)]
pub struct ExternalAuthClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ExternalAuthClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ExternalIdentityProvider for ExternalAuthClient {
    async fn exchange(&self, session_id: &str) -> Result<ExternalIdentity, AppError> {
        let response = self
            .http
            .get(&self.endpoint)
            .header(SESSION_ID_HEADER, session_id)
            .send()
            .await
            .map_err(|e| AppError::ExternalAuth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::info!(status = status.as_u16(), "External session id rejected");
            return Err(AppError::ExternalAuthRejected);
        }

        let identity: ExternalIdentity = response
            .json()
            .await
            .map_err(|e| AppError::ExternalAuth(format!("Malformed identity response: {}", e)))?;

        validate_identity(identity)
    }
}

/// Reject identities that cannot back a local account or a session.
/// The session token is returned trimmed.
pub fn validate_identity(mut identity: ExternalIdentity) -> Result<ExternalIdentity, AppError> {
    identity.session_token = identity.session_token.trim().to_string();
    if identity.session_token.is_empty() || identity.email.trim().is_empty() {
        tracing::warn!("External identity missing email or session token");
        return Err(AppError::ExternalAuthRejected);
    }
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_parses_without_optional_fields() {
        let json = r#"{"email":"a@x.com","name":"A","session_token":"tok"}"#;
        let identity: ExternalIdentity = serde_json::from_str(json).unwrap();
        assert!(identity.picture.is_none());
        assert!(identity.id.is_none());
        assert!(validate_identity(identity).is_ok());
    }

    #[test]
    fn test_token_is_trimmed() {
        let json = r#"{"email":"a@x.com","name":"A","session_token":" tok "}"#;
        let identity: ExternalIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(validate_identity(identity).unwrap().session_token, "tok");
    }

    #[test]
    fn test_blank_token_rejected() {
        let json = r#"{"email":"a@x.com","name":"A","session_token":"  "}"#;
        let identity: ExternalIdentity = serde_json::from_str(json).unwrap();
        assert!(matches!(
            validate_identity(identity),
            Err(AppError::ExternalAuthRejected)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_transport_error() {
        // Port 9 (discard) on loopback refuses connections.
        let client = ExternalAuthClient::new("http://127.0.0.1:9/session-data").unwrap();
        let err = client.exchange("sid").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalAuth(_)));
    }
}
