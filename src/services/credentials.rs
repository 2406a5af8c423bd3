//! Password hashing (argon2id).

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::random;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use ring::rand::SystemRandom;

const SALT_BYTES: usize = 16;

/// Hashes and verifies passwords. Cheap to clone.
#[derive(Clone)]
pub struct Credentials {
    argon2: Argon2<'static>,
}

impl Credentials {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Invalid argon2 parameters: {}", e))
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.argon2_memory_kib, config.argon2_iterations)
    }

    pub fn hash_password(&self, plain: &str) -> Result<String> {
        let mut salt_bytes = [0u8; SALT_BYTES];
        random::fill(&SystemRandom::new(), &mut salt_bytes)?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to encode salt: {}", e))
        })?;
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "argon2 hash_password error");
                AppError::Internal(anyhow::anyhow!(e.to_string()))
            })?
            .to_string();
        Ok(hash)
    }

    /// Verify against a stored PHC string. Parameters come from the hash itself.
    pub fn verify_password(&self, plain: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = %e, "argon2 parse hash error");
            AppError::Internal(anyhow::anyhow!(e.to_string()))
        })?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Hash on the blocking pool; argon2 is deliberately slow.
    pub async fn hash_password_blocking(&self, plain: &str) -> Result<String> {
        let this = self.clone();
        let plain = plain.to_string();
        tokio::task::spawn_blocking(move || this.hash_password(&plain))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
    }

    pub async fn verify_password_blocking(&self, plain: &str, hash: &str) -> Result<bool> {
        let this = self.clone();
        let plain = plain.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || this.verify_password(&plain, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Verification task failed: {}", e)))?
    }
}
