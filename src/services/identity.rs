// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity registry: registration, login and external sign-in.
//!
//! Handles:
//! - Email/password registration (argon2 hash, friend code allocation)
//! - Email/password login
//! - External session exchange, provisioning password-less users on first use

use crate::db::{DocumentStore, StoreError};
use crate::error::{AppError, Result};
use crate::models::user::normalize_email;
use crate::models::User;
use crate::services::credentials::Credentials;
use crate::services::external_auth::ExternalIdentityProvider;
use crate::services::friend_code::generate_friend_code;
use crate::services::random;
use crate::services::session::SessionManager;
use chrono::Utc;
use ring::rand::SystemRandom;
use std::sync::Arc;

/// A user together with a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub session_token: String,
}

/// Fields for a user that does not exist yet.
struct NewUser {
    email: String,
    name: String,
    password_hash: Option<String>,
    picture: Option<String>,
}

#[derive(Clone)]
pub struct IdentityRegistry {
    store: Arc<dyn DocumentStore>,
    credentials: Credentials,
    sessions: SessionManager,
    external: Arc<dyn ExternalIdentityProvider>,
    friend_code_attempts: u32,
}

impl IdentityRegistry {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        credentials: Credentials,
        sessions: SessionManager,
        external: Arc<dyn ExternalIdentityProvider>,
        friend_code_attempts: u32,
    ) -> Self {
        Self {
            store,
            credentials,
            sessions,
            external,
            friend_code_attempts,
        }
    }

    /// Register with email and password.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<AuthSession> {
        let email = normalize_email(email);
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name must not be empty".to_string()));
        }

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }

        let password_hash = self.credentials.hash_password_blocking(password).await?;
        let user = self
            .provision_user(NewUser {
                email,
                name: name.to_string(),
                password_hash: Some(password_hash),
                picture: None,
            })
            .await?;

        let session_token = self.sessions.create_session(&user.user_id).await?;
        tracing::info!(user_id = %user.user_id, "User registered");

        Ok(AuthSession {
            user,
            session_token,
        })
    }

    /// Log in with email and password.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = normalize_email(email);

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(AppError::OAuthOnlyAccount);
        };

        if !self
            .credentials
            .verify_password_blocking(password, password_hash)
            .await?
        {
            tracing::info!(user_id = %user.user_id, "Login rejected: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let session_token = self.sessions.create_session(&user.user_id).await?;
        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(AuthSession {
            user,
            session_token,
        })
    }

    /// Exchange an external session id for a local user and session.
    ///
    /// The provider's session token becomes this service's bearer token.
    pub async fn exchange_external_session(&self, session_id: &str) -> Result<AuthSession> {
        let identity = self.external.exchange(session_id).await?;
        let email = normalize_email(&identity.email);
        let session_token = identity.session_token.trim().to_string();

        let user = match self.store.find_user_by_email(&email).await? {
            Some(existing) => existing,
            None => {
                let provisioned = self
                    .provision_user(NewUser {
                        email: email.clone(),
                        name: identity.name.trim().to_string(),
                        password_hash: None,
                        picture: identity.picture.clone(),
                    })
                    .await;

                match provisioned {
                    Ok(user) => {
                        tracing::info!(user_id = %user.user_id, "User provisioned from external sign-in");
                        user
                    }
                    // A concurrent exchange for the same person won the race.
                    Err(AppError::EmailTaken) => self
                        .store
                        .find_user_by_email(&email)
                        .await?
                        .ok_or(AppError::UserNotFound)?,
                    Err(e) => return Err(e),
                }
            }
        };

        self.sessions
            .create_session_with_token(&user.user_id, &session_token)
            .await?;

        Ok(AuthSession {
            user,
            session_token,
        })
    }

    pub async fn get(&self, user_id: &str) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Create a user with a unique friend code.
    ///
    /// Each attempt draws a new code; the store rejects the write if the code
    /// (or email) was claimed in the meantime. Gives up after
    /// `friend_code_attempts` draws.
    async fn provision_user(&self, new_user: NewUser) -> Result<User> {
        let rng = SystemRandom::new();

        for attempt in 1..=self.friend_code_attempts {
            let friend_code = generate_friend_code(&rng)?;

            if self
                .store
                .find_user_by_friend_code(&friend_code)
                .await?
                .is_some()
            {
                tracing::debug!(attempt, "Friend code collision, regenerating");
                continue;
            }

            let user = User {
                user_id: random::prefixed_id("user")?,
                email: new_user.email.clone(),
                name: new_user.name.clone(),
                password_hash: new_user.password_hash.clone(),
                picture: new_user.picture.clone(),
                friend_code,
                partner_id: None,
                created_at: Utc::now(),
            };

            match self.store.create_user(&user).await {
                Ok(()) => return Ok(user),
                Err(StoreError::Conflict(reason)) => {
                    if self.store.find_user_by_email(&user.email).await?.is_some() {
                        return Err(AppError::EmailTaken);
                    }
                    tracing::debug!(attempt, reason = %reason, "User create conflicted, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(
            attempts = self.friend_code_attempts,
            "Could not allocate a unique friend code"
        );
        Err(AppError::CodeSpaceExhausted)
    }
}
