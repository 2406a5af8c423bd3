//! Database layer.
//!
//! Services talk to a [`DocumentStore`]; production uses Firestore and tests
//! (or `STORE_BACKEND=memory`) use the in-process [`MemoryStore`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{BucketItem, CompletedItem, CompletionDraft, Session, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email claims, keyed by url-encoded email
    pub const USER_EMAILS: &str = "user_emails";
    /// Friend code claims, keyed by code
    pub const FRIEND_CODES: &str = "friend_codes";
    pub const SESSIONS: &str = "user_sessions";
    pub const BUCKET_ITEMS: &str = "bucket_items";
    pub const COMPLETED_ITEMS: &str = "completed_items";
}

/// Claim document pointing a unique key (email, friend code) at its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub user_id: String,
}

/// Store-level errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A create-only write hit an existing document.
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Database(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result of an attempt to pair two users.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    /// Both records were updated; carries the fresh copies.
    Linked { requester: User, partner: User },
    RequesterPaired,
    TargetPaired,
    UserMissing,
}

/// Document store used by every service.
///
/// Multi-document operations (`create_user`, `link_partners`, `delete_item`,
/// `complete_item`) are atomic: they either apply completely or not at all.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// Look up a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_friend_code(&self, code: &str) -> StoreResult<Option<User>>;

    /// Create a user together with its email and friend-code claims.
    ///
    /// Fails with [`StoreError::Conflict`] if the user id, email or friend code
    /// is already taken.
    async fn create_user(&self, user: &User) -> StoreResult<()>;

    /// Set `partner_id` on both users, only if both are currently unpaired.
    async fn link_partners(&self, requester_id: &str, target_id: &str)
        -> StoreResult<LinkOutcome>;

    // ─── Sessions ────────────────────────────────────────────────

    /// Create or overwrite a session.
    async fn put_session(&self, session: &Session) -> StoreResult<()>;

    async fn get_session(&self, token_hash: &str) -> StoreResult<Option<Session>>;

    /// Delete a session. Deleting a missing session is not an error.
    async fn delete_session(&self, token_hash: &str) -> StoreResult<()>;

    // ─── Bucket Items ────────────────────────────────────────────

    async fn create_item(&self, item: &BucketItem) -> StoreResult<()>;

    /// Items shared with `user_id` that are not completed yet.
    async fn list_active_items(&self, user_id: &str) -> StoreResult<Vec<BucketItem>>;

    /// Delete an item shared with `user_id`. Returns `false` if there was none.
    async fn delete_item(&self, item_id: &str, user_id: &str) -> StoreResult<bool>;

    /// Flip an open item shared with `user_id` to completed and record the completion.
    ///
    /// Returns `None` if the item is missing, not shared with the user, or
    /// already completed.
    async fn complete_item(
        &self,
        item_id: &str,
        user_id: &str,
        draft: CompletionDraft,
    ) -> StoreResult<Option<CompletedItem>>;

    /// Completion records made by any of `user_ids`, newest first.
    async fn list_completed(&self, user_ids: &[String]) -> StoreResult<Vec<CompletedItem>>;
}

/// Sort completion records newest first.
pub(crate) fn sort_newest_first(items: &mut [CompletedItem]) {
    items.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
}
