// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared bucket list routes (require authentication).

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{BucketItem, CompletedItem};
use crate::routes::MessageResponse;
use crate::AppState;

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bucketlist", get(list_items).post(create_item))
        .route("/api/bucketlist/complete", post(complete_item))
        .route("/api/bucketlist/{item_id}", delete(delete_item))
        .route("/api/completed", get(list_completed))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteItemRequest {
    #[validate(length(min = 1))]
    pub item_id: String,
    #[validate(length(min = 1))]
    pub photo_base64: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

// ─── Active Items ────────────────────────────────────────────

async fn list_items(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<BucketItem>>> {
    let items = state.bucket_list.list_active(&user).await?;
    tracing::debug!(user_id = %user.user_id, count = items.len(), "Fetched active items");
    Ok(Json(items))
}

async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<CreateItemRequest>,
) -> Result<Json<BucketItem>> {
    request.validate()?;
    let item = state
        .bucket_list
        .create(&user, &request.title, &request.category)
        .await?;
    Ok(Json(item))
}

async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(item_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.bucket_list.delete(&item_id, &user).await?;
    Ok(MessageResponse::new("Item deleted successfully"))
}

// ─── Completion ──────────────────────────────────────────────

async fn complete_item(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(request): Json<CompleteItemRequest>,
) -> Result<Json<CompletedItem>> {
    request.validate()?;
    let record = state
        .bucket_list
        .complete(&request.item_id, &user, request.photo_base64, request.notes)
        .await?;
    Ok(Json(record))
}

async fn list_completed(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<CompletedItem>>> {
    Ok(Json(state.bucket_list.list_completed(&user).await?))
}
