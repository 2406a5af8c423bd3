//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::rfc3339;

/// User record stored in the `users` collection (document ID is `user_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identifier, `user_<12 hex>`
    pub user_id: String,
    /// Lower-cased, trimmed email address
    pub email: String,
    /// Display name
    pub name: String,
    /// Argon2 PHC string; absent for accounts created through the external exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Profile picture URL
    #[serde(default)]
    pub picture: Option<String>,
    /// Public pairing code (5 chars, A-Z0-9)
    pub friend_code: String,
    /// The paired partner, if any. Always mutual.
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(with = "rfc3339")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_paired(&self) -> bool {
        self.partner_id.is_some()
    }
}

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User as returned by the API (never carries the password hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub friend_code: String,
    pub partner_id: Option<String>,
    #[serde(with = "rfc3339")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
            friend_code: user.friend_code.clone(),
            partner_id: user.partner_id.clone(),
            created_at: user.created_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let user = User {
            user_id: "user_abc".to_string(),
            email: "a@x.com".to_string(),
            name: "A".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            picture: None,
            friend_code: "ABCDE".to_string(),
            partner_id: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["friend_code"], "ABCDE");
        assert!(json["partner_id"].is_null());
    }

    #[test]
    fn test_oauth_user_deserializes_without_password() {
        let json = r#"{
            "user_id": "user_1",
            "email": "b@x.com",
            "name": "B",
            "friend_code": "ZZZ99",
            "created_at": "2024-01-15T10:00:00.000000Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.password_hash.is_none());
        assert!(!user.is_paired());
    }
}
