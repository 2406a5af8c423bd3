// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared bucket list.
//!
//! Items are visible to the two users in `shared_with`. Completing an item is a
//! one-way transition that leaves an immutable completion record behind.

use crate::db::DocumentStore;
use crate::error::{AppError, Result};
use crate::models::{BucketItem, CompletedItem, CompletionDraft, User};
use crate::services::random;
use chrono::Utc;
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedListEngine {
    store: Arc<dyn DocumentStore>,
}

impl SharedListEngine {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Open items shared with `user`. Order is unspecified.
    pub async fn list_active(&self, user: &User) -> Result<Vec<BucketItem>> {
        Ok(self.store.list_active_items(&user.user_id).await?)
    }

    /// Create an item shared between `user` and their partner.
    pub async fn create(&self, user: &User, title: &str, category: &str) -> Result<BucketItem> {
        let partner_id = user.partner_id.clone().ok_or(AppError::NoPartner)?;

        let title = title.trim();
        let category = category.trim();
        if title.is_empty() || category.is_empty() {
            return Err(AppError::BadRequest(
                "Title and category must not be empty".to_string(),
            ));
        }

        let item = BucketItem {
            item_id: random::prefixed_id("item")?,
            title: title.to_string(),
            category: category.to_string(),
            created_by: user.user_id.clone(),
            created_at: Utc::now(),
            completed: false,
            shared_with: vec![user.user_id.clone(), partner_id],
        };

        self.store.create_item(&item).await?;
        tracing::info!(user_id = %user.user_id, item_id = %item.item_id, "Bucket item created");

        Ok(item)
    }

    /// Delete an item shared with `user`. Either partner may delete.
    pub async fn delete(&self, item_id: &str, user: &User) -> Result<()> {
        if !self.store.delete_item(item_id, &user.user_id).await? {
            return Err(AppError::NotFound("Item not found".to_string()));
        }
        tracing::info!(user_id = %user.user_id, item_id, "Bucket item deleted");
        Ok(())
    }

    /// Complete an open item shared with `user`.
    ///
    /// Missing, foreign and already-completed items all yield `NotFound`.
    pub async fn complete(
        &self,
        item_id: &str,
        user: &User,
        photo_base64: String,
        notes: Option<String>,
    ) -> Result<CompletedItem> {
        let draft = CompletionDraft {
            completed_id: random::prefixed_id("completed")?,
            completed_by: user.user_id.clone(),
            photo_base64,
            notes: notes.filter(|n| !n.trim().is_empty()),
            completed_at: Utc::now(),
        };

        self.store
            .complete_item(item_id, &user.user_id, draft)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found or already completed".to_string()))
    }

    /// Completion records for the pair, newest first. Unpaired users get none.
    pub async fn list_completed(&self, user: &User) -> Result<Vec<CompletedItem>> {
        let Some(partner_id) = user.partner_id.clone() else {
            return Ok(Vec::new());
        };

        Ok(self
            .store
            .list_completed(&[user.user_id.clone(), partner_id])
            .await?)
    }
}
