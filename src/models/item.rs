// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Shared bucket-list items and their completion records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::rfc3339;

/// A goal shared by both members of a pair (`bucket_items` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BucketItem {
    /// `item_<12 hex>` (also used as document ID)
    pub item_id: String,
    pub title: String,
    pub category: String,
    pub created_by: String,
    #[serde(with = "rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    /// Creator and partner at creation time; never changes afterwards
    pub shared_with: Vec<String>,
}

impl BucketItem {
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.shared_with.iter().any(|id| id == user_id)
    }
}

/// Immutable proof that an item was completed (`completed_items` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletedItem {
    /// `completed_<12 hex>` (also used as document ID)
    pub completed_id: String,
    pub item_id: String,
    /// Copied from the item when it was completed
    pub title: String,
    pub category: String,
    /// Image payload as sent by the client (data URI or raw base64)
    pub photo_base64: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub completed_at: DateTime<Utc>,
    pub completed_by: String,
}

/// The caller-supplied half of a completion; the store fills in the item snapshot.
#[derive(Debug, Clone)]
pub struct CompletionDraft {
    pub completed_id: String,
    pub completed_by: String,
    pub photo_base64: String,
    pub notes: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl CompletedItem {
    pub fn from_item(item: &BucketItem, draft: CompletionDraft) -> Self {
        Self {
            completed_id: draft.completed_id,
            item_id: item.item_id.clone(),
            title: item.title.clone(),
            category: item.category.clone(),
            photo_base64: draft.photo_base64,
            notes: draft.notes,
            completed_at: draft.completed_at,
            completed_by: draft.completed_by,
        }
    }
}
