// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::error::AppError;
use crate::models::User;
use crate::services::session::bearer_token;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "session_token";

/// Authenticated user, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Session token carried by the `session_token` cookie, if any.
pub fn cookie_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Find the session token: `Authorization` header first, then cookie.
pub fn session_token_from(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
        .or_else(|| cookie_token(jar))
}

/// Middleware that requires a valid, unexpired session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token_from(&jar, request.headers()).ok_or(AppError::Unauthenticated)?;
    let user = state.sessions.authenticate_token(&token).await?;

    request.extensions_mut().insert(AuthUser(user));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn test_header_takes_precedence() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "from-cookie"));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            session_token_from(&jar, &headers),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn test_cookie_fallback() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "from-cookie"));

        assert_eq!(
            session_token_from(&jar, &HeaderMap::new()),
            Some("from-cookie".to_string())
        );

        let blank = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "  "));
        assert_eq!(cookie_token(&blank), None);
    }

    #[test]
    fn test_header_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            session_token_from(&CookieJar::new(), &headers),
            Some("from-header".to_string())
        );
        assert_eq!(session_token_from(&CookieJar::new(), &HeaderMap::new()), None);
    }
}
