//! Partner pairing.
//!
//! The only writer of `User::partner_id`. Pairing is mutual and permanent.

use crate::db::{DocumentStore, LinkOutcome};
use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::friend_code::{is_well_formed, normalize_friend_code};
use std::sync::Arc;

#[derive(Clone)]
pub struct PairingService {
    store: Arc<dyn DocumentStore>,
}

impl PairingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Pair `requester` with the owner of `friend_code`, returning the partner.
    pub async fn connect_by_friend_code(&self, requester: &User, friend_code: &str) -> Result<User> {
        if requester.is_paired() {
            return Err(AppError::AlreadyPaired);
        }

        let code = normalize_friend_code(friend_code);
        if !is_well_formed(&code) {
            return Err(AppError::FriendCodeNotFound);
        }

        let target = self
            .store
            .find_user_by_friend_code(&code)
            .await?
            .ok_or(AppError::FriendCodeNotFound)?;

        if target.user_id == requester.user_id {
            return Err(AppError::SelfPairing);
        }
        if target.is_paired() {
            return Err(AppError::TargetAlreadyPaired);
        }

        // Re-checked atomically: either side may have paired since the reads above.
        match self
            .store
            .link_partners(&requester.user_id, &target.user_id)
            .await?
        {
            LinkOutcome::Linked { partner, .. } => {
                tracing::info!(
                    user_id = %requester.user_id,
                    partner_id = %partner.user_id,
                    "Users paired"
                );
                Ok(partner)
            }
            LinkOutcome::RequesterPaired => Err(AppError::AlreadyPaired),
            LinkOutcome::TargetPaired => Err(AppError::TargetAlreadyPaired),
            LinkOutcome::UserMissing => Err(AppError::UserNotFound),
        }
    }
}
