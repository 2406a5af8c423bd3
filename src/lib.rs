// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pairlist: a shared bucket list for two.
//!
//! This crate provides the backend API: accounts and sessions, pairing two
//! users through a friend code, and the list of goals the pair shares.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::DocumentStore;
use error::Result;
use services::{
    Credentials, ExternalIdentityProvider, IdentityRegistry, PairingService, SessionManager,
    SharedListEngine,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub sessions: SessionManager,
    pub identity: IdentityRegistry,
    pub pairing: PairingService,
    pub bucket_list: SharedListEngine,
}

impl AppState {
    /// Wire every service to the same store handle.
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        external: Arc<dyn ExternalIdentityProvider>,
    ) -> Result<Self> {
        let credentials = Credentials::from_config(&config)?;
        let sessions = SessionManager::new(store.clone(), config.session_ttl());
        let identity = IdentityRegistry::new(
            store.clone(),
            credentials,
            sessions.clone(),
            external,
            config.friend_code_max_attempts,
        );

        Ok(Self {
            pairing: PairingService::new(store.clone()),
            bucket_list: SharedListEngine::new(store.clone()),
            config,
            store,
            sessions,
            identity,
        })
    }
}
