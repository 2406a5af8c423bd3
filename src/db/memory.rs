//! In-process document store.
//!
//! Backed by `DashMap`s, one per collection. Single-document operations rely on
//! the per-entry locks; user creation and pairing touch several documents and
//! are serialized by `user_writes`.

use crate::db::{sort_newest_first, DocumentStore, LinkOutcome, StoreError, StoreResult};
use crate::models::{BucketItem, CompletedItem, CompletionDraft, Session, User};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// email -> user_id
    emails: DashMap<String, String>,
    /// friend code -> user_id
    friend_codes: DashMap<String, String>,
    /// token hash -> session
    sessions: DashMap<String, Session>,
    items: DashMap<String, BucketItem>,
    completed: DashMap<String, CompletedItem>,
    user_writes: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_user_writes(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.user_writes
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn user_by_index(&self, index: &DashMap<String, String>, key: &str) -> Option<User> {
        let user_id = index.get(key)?.value().clone();
        self.users.get(&user_id).map(|u| u.value().clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.get(user_id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.user_by_index(&self.emails, email))
    }

    async fn find_user_by_friend_code(&self, code: &str) -> StoreResult<Option<User>> {
        Ok(self.user_by_index(&self.friend_codes, code))
    }

    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let _guard = self.lock_user_writes()?;

        if self.users.contains_key(&user.user_id) {
            return Err(StoreError::Conflict(format!("user {}", user.user_id)));
        }
        if self.emails.contains_key(&user.email) {
            return Err(StoreError::Conflict("email already claimed".to_string()));
        }
        if self.friend_codes.contains_key(&user.friend_code) {
            return Err(StoreError::Conflict("friend code already claimed".to_string()));
        }

        self.emails
            .insert(user.email.clone(), user.user_id.clone());
        self.friend_codes
            .insert(user.friend_code.clone(), user.user_id.clone());
        self.users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn link_partners(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> StoreResult<LinkOutcome> {
        let _guard = self.lock_user_writes()?;

        let (Some(mut requester), Some(mut partner)) = (
            self.users.get(requester_id).map(|u| u.value().clone()),
            self.users.get(target_id).map(|u| u.value().clone()),
        ) else {
            return Ok(LinkOutcome::UserMissing);
        };

        if requester.is_paired() {
            return Ok(LinkOutcome::RequesterPaired);
        }
        if partner.is_paired() {
            return Ok(LinkOutcome::TargetPaired);
        }

        requester.partner_id = Some(partner.user_id.clone());
        partner.partner_id = Some(requester.user_id.clone());
        self.users.insert(requester.user_id.clone(), requester.clone());
        self.users.insert(partner.user_id.clone(), partner.clone());

        Ok(LinkOutcome::Linked { requester, partner })
    }

    async fn put_session(&self, session: &Session) -> StoreResult<()> {
        self.sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, token_hash: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions.get(token_hash).map(|s| s.value().clone()))
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()> {
        self.sessions.remove(token_hash);
        Ok(())
    }

    async fn create_item(&self, item: &BucketItem) -> StoreResult<()> {
        match self.items.entry(item.item_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(StoreError::Conflict(format!("item {}", item.item_id)))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(item.clone());
                Ok(())
            }
        }
    }

    async fn list_active_items(&self, user_id: &str) -> StoreResult<Vec<BucketItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| !item.completed && item.is_visible_to(user_id))
            .map(|item| item.value().clone())
            .collect())
    }

    async fn delete_item(&self, item_id: &str, user_id: &str) -> StoreResult<bool> {
        Ok(self
            .items
            .remove_if(item_id, |_, item| item.is_visible_to(user_id))
            .is_some())
    }

    async fn complete_item(
        &self,
        item_id: &str,
        user_id: &str,
        draft: CompletionDraft,
    ) -> StoreResult<Option<CompletedItem>> {
        // Holding the entry lock makes the check-and-flip atomic per item.
        let Some(mut item) = self.items.get_mut(item_id) else {
            return Ok(None);
        };
        if item.completed || !item.is_visible_to(user_id) {
            return Ok(None);
        }

        let record = CompletedItem::from_item(&item, draft);
        if self.completed.contains_key(&record.completed_id) {
            return Err(StoreError::Conflict(format!(
                "completion {}",
                record.completed_id
            )));
        }

        item.completed = true;
        self.completed
            .insert(record.completed_id.clone(), record.clone());
        Ok(Some(record))
    }

    async fn list_completed(&self, user_ids: &[String]) -> StoreResult<Vec<CompletedItem>> {
        let mut records: Vec<CompletedItem> = self
            .completed
            .iter()
            .filter(|record| user_ids.contains(&record.completed_by))
            .map(|record| record.value().clone())
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
}
