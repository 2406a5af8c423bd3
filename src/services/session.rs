// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer session management.
//!
//! Tokens have a fixed lifetime and are never refreshed. Expired sessions are
//! rejected when read; nothing sweeps them.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::session::hash_token;
use crate::models::{Session, User};
use crate::services::random;
use chrono::Utc;
use std::sync::Arc;

/// Extract the token from an `Authorization` header value.
///
/// The `Bearer ` prefix is optional; blank values yield `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    ttl: chrono::Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DocumentStore>, ttl: chrono::Duration) -> Self {
        Self { store, ttl }
    }

    /// Mint a new token for `user_id` and persist its session.
    pub async fn create_session(&self, user_id: &str) -> Result<String> {
        let token = random::session_token()?;
        self.create_session_with_token(user_id, &token).await?;
        Ok(token)
    }

    /// Persist a session for a token minted elsewhere (external identity exchange).
    pub async fn create_session_with_token(&self, user_id: &str, token: &str) -> Result<()> {
        let session = Session::new(token, user_id, Utc::now(), self.ttl);
        self.store.put_session(&session).await?;
        tracing::debug!(user_id, expires_at = %session.expires_at, "Session created");
        Ok(())
    }

    /// Resolve an `Authorization` header to its user.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<User> {
        let token = header
            .and_then(bearer_token)
            .ok_or(AppError::Unauthenticated)?;
        self.authenticate_token(token).await
    }

    /// Resolve a raw token to its user.
    pub async fn authenticate_token(&self, token: &str) -> Result<User> {
        let session = self
            .store
            .get_session(&hash_token(token))
            .await?
            .ok_or(AppError::Unauthenticated)?;

        if session.is_expired_at(Utc::now()) {
            tracing::debug!(user_id = %session.user_id, "Rejected expired session");
            return Err(AppError::SessionExpired);
        }

        self.store.get_user(&session.user_id).await?.ok_or_else(|| {
            tracing::warn!(user_id = %session.user_id, "Session refers to missing user");
            AppError::UserNotFound
        })
    }

    /// Delete the session for `token`. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.store.delete_session(&hash_token(token)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn user(id: &str) -> User {
        User {
            user_id: id.to_string(),
            email: format!("{}@x.com", id),
            name: id.to_string(),
            password_hash: None,
            picture: None,
            friend_code: "ABCDE".to_string(),
            partner_id: None,
            created_at: Utc::now(),
        }
    }

    async fn setup() -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        store.create_user(&user("user_a")).await.unwrap();
        let sessions = SessionManager::new(store.clone(), chrono::Duration::days(7));
        (store, sessions)
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("abc"), Some("abc"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }

    #[tokio::test]
    async fn test_create_then_authenticate() {
        let (_, sessions) = setup().await;
        let token = sessions.create_session("user_a").await.unwrap();

        let header = format!("Bearer {}", token);
        let user = sessions.authenticate(Some(&header)).await.unwrap();
        assert_eq!(user.user_id, "user_a");

        // Prefix is optional.
        let user = sessions.authenticate(Some(&token)).await.unwrap();
        assert_eq!(user.user_id, "user_a");
    }

    #[tokio::test]
    async fn test_missing_or_unknown_token() {
        let (_, sessions) = setup().await;
        assert!(matches!(
            sessions.authenticate(None).await,
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            sessions.authenticate(Some("Bearer nope")).await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_not_deleted() {
        let (store, sessions) = setup().await;
        let created = Utc::now() - chrono::Duration::days(8);
        let session = Session::new("old-token", "user_a", created, chrono::Duration::days(7));
        store.put_session(&session).await.unwrap();

        assert!(matches!(
            sessions.authenticate_token("old-token").await,
            Err(AppError::SessionExpired)
        ));
        assert!(store
            .get_session(&hash_token("old-token"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_dangling_session() {
        let (_, sessions) = setup().await;
        sessions
            .create_session_with_token("user_gone", "dangling")
            .await
            .unwrap();
        assert!(matches!(
            sessions.authenticate_token("dangling").await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (_, sessions) = setup().await;
        let token = sessions.create_session("user_a").await.unwrap();

        sessions.revoke(&token).await.unwrap();
        sessions.revoke(&token).await.unwrap();
        assert!(matches!(
            sessions.authenticate_token(&token).await,
            Err(AppError::Unauthenticated)
        ));
    }
}
