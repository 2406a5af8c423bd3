// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod bucket_list;
pub mod credentials;
pub mod external_auth;
pub mod friend_code;
pub mod identity;
pub mod pairing;
pub mod random;
pub mod session;

pub use bucket_list::SharedListEngine;
pub use credentials::Credentials;
pub use external_auth::{ExternalAuthClient, ExternalIdentity, ExternalIdentityProvider};
pub use identity::{AuthSession, IdentityRegistry};
pub use pairing::PairingService;
pub use session::SessionManager;
