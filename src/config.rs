//! Application configuration loaded from environment variables.
//!
//! A `.env` file is read first when present (local development).

use std::env;
use std::str::FromStr;

/// Default endpoint of the external identity exchange.
pub const DEFAULT_EXTERNAL_AUTH_URL: &str =
    "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data";

/// Which document store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Cloud Firestore (or its emulator when FIRESTORE_EMULATOR_HOST is set)
    Firestore,
    /// In-process store; data is lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Document store backend
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// External identity exchange endpoint
    pub external_auth_url: String,
    /// Session lifetime in days
    pub session_ttl_days: i64,
    /// Friend-code draws before giving up with `CodeSpaceExhausted`
    pub friend_code_max_attempts: u32,
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count
    pub argon2_iterations: u32,
}

impl Config {
    /// Config for tests: in-memory store and the cheapest valid argon2 parameters.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            external_auth_url: "http://127.0.0.1:9/session-data".to_string(),
            session_ttl_days: 7,
            friend_code_max_attempts: 16,
            argon2_memory_kib: 8,
            argon2_iterations: 1,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .parse()?;

        let gcp_project_id = match store_backend {
            StoreBackend::Firestore => {
                env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?
            }
            StoreBackend::Memory => {
                env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string())
            }
        };

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            store_backend,
            gcp_project_id,
            external_auth_url: env::var("EXTERNAL_AUTH_URL")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_EXTERNAL_AUTH_URL.to_string()),
            session_ttl_days: parse_or("SESSION_TTL_DAYS", 7)?,
            friend_code_max_attempts: parse_or("FRIEND_CODE_MAX_ATTEMPTS", 16)?,
            argon2_memory_kib: parse_or("ARGON2_MEMORY_KIB", 19 * 1024)?,
            argon2_iterations: parse_or("ARGON2_ITERATIONS", 2)?,
        })
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }
}

/// Read an optional numeric variable, rejecting values that do not parse.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
