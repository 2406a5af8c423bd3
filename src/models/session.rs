//! Bearer session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::time_utils::rfc3339;

/// Session stored in the `user_sessions` collection.
///
/// The document ID is `token_hash`; the bearer token itself is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Hex SHA-256 of the bearer token
    pub token_hash: String,
    /// Owning user
    pub user_id: String,
    #[serde(with = "rfc3339")]
    pub expires_at: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: &str, user_id: &str, created_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            token_hash: hash_token(token),
            user_id: user_id.to_string(),
            expires_at: created_at + ttl,
            created_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Hash a bearer token into its storage key.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_stable_hex() {
        let a = hash_token("session_abc");
        assert_eq!(a.len(), 64);
        assert_eq!(a, hash_token("session_abc"));
        assert_ne!(a, hash_token("session_abd"));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let session = Session::new("t", "user_1", now, chrono::Duration::days(7));

        assert!(!session.is_expired_at(now));
        assert!(!session.is_expired_at(session.expires_at));
        assert!(session.is_expired_at(session.expires_at + chrono::Duration::seconds(1)));
    }
}
