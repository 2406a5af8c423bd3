// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{cookie_token, session_token_from, AuthUser, SESSION_COOKIE};
use crate::models::UserProfile;
use crate::routes::MessageResponse;
use crate::services::external_auth::SESSION_ID_HEADER;
use crate::services::AuthSession;
use crate::AppState;

/// Routes that issue or revoke sessions (no session required).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/session", post(exchange_session))
        .route("/api/auth/logout", post(logout))
}

/// Routes that need an authenticated user.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/me", get(get_me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub session_token: String,
    pub user: UserProfile,
}

/// Response of the external session exchange. `id` is the local user id.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionDataResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub session_token: String,
}

/// Cookie mirroring the bearer token for browser clients.
fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

fn login_response(jar: CookieJar, auth: AuthSession) -> (CookieJar, Json<LoginResponse>) {
    let jar = jar.add(session_cookie(&auth.session_token));
    let body = LoginResponse {
        user: UserProfile::from(&auth.user),
        session_token: auth.session_token,
    };
    (jar, Json(body))
}

/// Register with email and password.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    request.validate()?;

    let auth = state
        .identity
        .register(&request.email, &request.password, &request.name)
        .await?;

    Ok(login_response(jar, auth))
}

/// Log in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    request.validate()?;

    let auth = state
        .identity
        .login(&request.email, &request.password)
        .await?;

    Ok(login_response(jar, auth))
}

/// Exchange an external session id (`X-Session-ID` header) for a session.
async fn exchange_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<SessionDataResponse>)> {
    let session_id = headers
        .get(SESSION_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Session ID required".to_string()))?;

    let auth = state.identity.exchange_external_session(session_id).await?;
    tracing::info!(user_id = %auth.user.user_id, "External session exchanged");

    let jar = jar.add(session_cookie(&auth.session_token));
    Ok((
        jar,
        Json(SessionDataResponse {
            id: auth.user.user_id,
            email: auth.user.email,
            name: auth.user.name,
            picture: auth.user.picture,
            session_token: auth.session_token,
        }),
    ))
}

/// Get the current user.
async fn get_me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<UserProfile> {
    Json(UserProfile::from(user))
}

/// Revoke the presented session, and the cookie session when it differs.
/// Revoking an unknown or expired token succeeds.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<MessageResponse>)> {
    let token = session_token_from(&jar, &headers).ok_or(AppError::Unauthenticated)?;
    state.sessions.revoke(&token).await?;

    if let Some(cookie) = cookie_token(&jar).filter(|c| *c != token) {
        state.sessions.revoke(&cookie).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, MessageResponse::new("Logged out successfully")))
}
