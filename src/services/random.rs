//! Random identifiers and tokens from the system CSPRNG.

use crate::error::{AppError, Result};
use ring::rand::{SecureRandom, SystemRandom};

/// Random bytes per session token (256 bits).
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Random bytes in a record id suffix (12 hex chars).
const ID_BYTES: usize = 6;

/// Fill `buf` from `rng`.
pub fn fill(rng: &dyn SecureRandom, buf: &mut [u8]) -> Result<()> {
    rng.fill(buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System random source failed")))
}

/// `len` random bytes, hex-encoded.
pub fn random_hex(len: usize) -> Result<String> {
    let mut buf = vec![0u8; len];
    fill(&SystemRandom::new(), &mut buf)?;
    Ok(hex::encode(buf))
}

/// A record id such as `item_3f9a0c12b7de`.
pub fn prefixed_id(prefix: &str) -> Result<String> {
    Ok(format!("{}_{}", prefix, random_hex(ID_BYTES)?))
}

/// A fresh bearer token, `session_` followed by 64 hex chars.
pub fn session_token() -> Result<String> {
    Ok(format!("session_{}", random_hex(SESSION_TOKEN_BYTES)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prefixed_id_shape() {
        let id = prefixed_id("user").unwrap();
        let suffix = id.strip_prefix("user_").unwrap();
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_session_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| session_token().unwrap()).collect();
        assert_eq!(tokens.len(), 100);
        assert!(tokens.iter().all(|t| t.len() == "session_".len() + 64));
    }
}
