// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage plus email / friend-code claim documents)
//! - Sessions (keyed by token hash)
//! - Bucket items and completion records

use crate::db::{
    collections, sort_newest_first, DocumentStore, IndexEntry, LinkOutcome, StoreError,
    StoreResult,
};
use crate::models::{BucketItem, CompletedItem, CompletionDraft, Session, User};
use async_trait::async_trait;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::FirestoreWritePrecondition;
use futures_util::future::try_join_all;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

fn backend(err: FirestoreError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Map a commit failure, treating precondition violations as conflicts.
fn commit_error(err: FirestoreError) -> StoreError {
    match err {
        FirestoreError::DataConflictError(e) => StoreError::Conflict(e.to_string()),
        other => StoreError::Backend(format!("Transaction commit failed: {}", other)),
    }
}

/// Document ID for an email claim. Emails may contain `/`, which Firestore rejects.
fn email_doc_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> StoreResult<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> StoreResult<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Resolve a claim document to the user it points at.
    async fn user_by_index(&self, collection: &str, key: &str) -> StoreResult<Option<User>> {
        let entry: Option<IndexEntry> = self
            .client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(key)
            .await
            .map_err(backend)?;

        match entry {
            Some(entry) => self.get_user(&entry.user_id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(backend)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.user_by_index(collections::USER_EMAILS, &email_doc_id(email))
            .await
    }

    async fn find_user_by_friend_code(&self, code: &str) -> StoreResult<Option<User>> {
        self.user_by_index(collections::FRIEND_CODES, code).await
    }

    /// Writes the user and both claim documents in one transaction, each with an
    /// `Exists(false)` precondition, so a taken email or code aborts the whole write.
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let client = &self.client;
        let claim = IndexEntry {
            user_id: user.user_id.clone(),
        };

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&user.user_id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(backend)?;

        client
            .fluent()
            .update()
            .in_col(collections::USER_EMAILS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(email_doc_id(&user.email))
            .object(&claim)
            .add_to_transaction(&mut transaction)
            .map_err(backend)?;

        client
            .fluent()
            .update()
            .in_col(collections::FRIEND_CODES)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&user.friend_code)
            .object(&claim)
            .add_to_transaction(&mut transaction)
            .map_err(backend)?;

        transaction.commit().await.map_err(commit_error)?;

        tracing::debug!(user_id = %user.user_id, "User document created");
        Ok(())
    }

    /// Both users are read inside the transaction, so a concurrent pairing of either
    /// one makes Firestore retry this closure against fresh data.
    async fn link_partners(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> StoreResult<LinkOutcome> {
        let requester_id = requester_id.to_string();
        let target_id = target_id.to_string();

        self.client
            .run_transaction(|db, transaction| {
                let requester_id = requester_id.clone();
                let target_id = target_id.clone();

                Box::pin(async move {
                    let requester: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&requester_id)
                        .await?;
                    let partner: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&target_id)
                        .await?;

                    let (Some(mut requester), Some(mut partner)) = (requester, partner) else {
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

                    for user in [&requester, &partner] {
                        db.fluent()
                            .update()
                            .in_col(collections::USERS)
                            .document_id(&user.user_id)
                            .object(user)
                            .add_to_transaction(transaction)?;
                    }

                    Ok::<_, BackoffError<FirestoreError>>(LinkOutcome::Linked {
                        requester,
                        partner,
                    })
                })
            })
            .await
            .map_err(backend)
    }

    // ─── Session Operations ──────────────────────────────────────

    async fn put_session(&self, session: &Session) -> StoreResult<()> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(&session.token_hash)
            .object(session)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn get_session(&self, token_hash: &str) -> StoreResult<Option<Session>> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(token_hash)
            .await
            .map_err(backend)
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()> {
        self.client
            .fluent()
            .delete()
            .from(collections::SESSIONS)
            .document_id(token_hash)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    // ─── Bucket Item Operations ──────────────────────────────────

    async fn create_item(&self, item: &BucketItem) -> StoreResult<()> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::BUCKET_ITEMS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&item.item_id)
            .object(item)
            .execute()
            .await
            .map_err(commit_error)?;
        Ok(())
    }

    async fn list_active_items(&self, user_id: &str) -> StoreResult<Vec<BucketItem>> {
        let user_id = user_id.to_string();
        self.client
            .fluent()
            .select()
            .from(collections::BUCKET_ITEMS)
            .filter(move |q| {
                q.for_all([
                    q.field("shared_with").array_contains(user_id.clone()),
                    q.field("completed").eq(false),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(backend)
    }

    async fn delete_item(&self, item_id: &str, user_id: &str) -> StoreResult<bool> {
        let item_id = item_id.to_string();
        let user_id = user_id.to_string();

        self.client
            .run_transaction(|db, transaction| {
                let item_id = item_id.clone();
                let user_id = user_id.clone();

                Box::pin(async move {
                    let item: Option<BucketItem> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::BUCKET_ITEMS)
                        .obj()
                        .one(&item_id)
                        .await?;

                    match item {
                        Some(item) if item.is_visible_to(&user_id) => {
                            db.fluent()
                                .delete()
                                .from(collections::BUCKET_ITEMS)
                                .document_id(&item_id)
                                .add_to_transaction(transaction)?;
                            Ok::<_, BackoffError<FirestoreError>>(true)
                        }
                        _ => Ok(false),
                    }
                })
            })
            .await
            .map_err(backend)
    }

    /// The item read, the flag flip and the completion record all happen in one
    /// transaction; a concurrent completion forces a retry that then sees
    /// `completed == true` and returns `None`.
    async fn complete_item(
        &self,
        item_id: &str,
        user_id: &str,
        draft: CompletionDraft,
    ) -> StoreResult<Option<CompletedItem>> {
        let item_id = item_id.to_string();
        let user_id = user_id.to_string();

        let record = self
            .client
            .run_transaction(|db, transaction| {
                let item_id = item_id.clone();
                let user_id = user_id.clone();
                let draft = draft.clone();

                Box::pin(async move {
                    let item: Option<BucketItem> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::BUCKET_ITEMS)
                        .obj()
                        .one(&item_id)
                        .await?;

                    let Some(mut item) = item else {
                        return Ok(None);
                    };
                    if item.completed || !item.is_visible_to(&user_id) {
                        return Ok(None);
                    }

                    let record = CompletedItem::from_item(&item, draft);
                    item.completed = true;

                    db.fluent()
                        .update()
                        .in_col(collections::BUCKET_ITEMS)
                        .document_id(&item.item_id)
                        .object(&item)
                        .add_to_transaction(transaction)?;

                    db.fluent()
                        .update()
                        .in_col(collections::COMPLETED_ITEMS)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(&record.completed_id)
                        .object(&record)
                        .add_to_transaction(transaction)?;

                    Ok::<_, BackoffError<FirestoreError>>(Some(record))
                })
            })
            .await
            .map_err(backend)?;

        if let Some(record) = &record {
            tracing::info!(
                item_id = %record.item_id,
                completed_id = %record.completed_id,
                "Item completed atomically"
            );
        }

        Ok(record)
    }

    async fn list_completed(&self, user_ids: &[String]) -> StoreResult<Vec<CompletedItem>> {
        let client = &self.client;

        // One equality query per member; no composite index needed.
        let queries = user_ids.iter().cloned().map(|user_id| async move {
            client
                .fluent()
                .select()
                .from(collections::COMPLETED_ITEMS)
                .filter(move |q| q.field("completed_by").eq(user_id.clone()))
                .obj::<CompletedItem>()
                .query()
                .await
                .map_err(backend)
        });

        let mut records: Vec<CompletedItem> = try_join_all(queries)
            .await?
            .into_iter()
            .flatten()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }
}
