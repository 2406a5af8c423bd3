//! Partner pairing route.

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::UserProfile;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/connect-friend", post(connect_friend))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConnectFriendRequest {
    #[validate(length(min = 1, max = 32))]
    pub friend_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ConnectFriendResponse {
    pub message: String,
    pub partner: UserProfile,
}

/// Pair with the owner of a friend code.
async fn connect_friend(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<ConnectFriendRequest>,
) -> Result<Json<ConnectFriendResponse>> {
    request.validate()?;

    let partner = state
        .pairing
        .connect_by_friend_code(&user, &request.friend_code)
        .await?;

    Ok(Json(ConnectFriendResponse {
        message: "Connected successfully".to_string(),
        partner: UserProfile::from(partner),
    }))
}
