//! Friend code generation.
//!
//! Codes are 5 characters drawn uniformly from `A-Z0-9` (36^5 ≈ 60M codes).
//! Uniqueness is enforced by the store when the owning user is created.

use crate::error::Result;
use crate::services::random;
use ring::rand::SecureRandom;

pub const FRIEND_CODE_LEN: usize = 5;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of 36 that fits in a byte; bytes at or above it are
/// rejected so every symbol is equally likely.
const ACCEPT_BELOW: u8 = 252;

/// Draw a random friend code.
pub fn generate_friend_code(rng: &dyn SecureRandom) -> Result<String> {
    let mut code = String::with_capacity(FRIEND_CODE_LEN);
    let mut buf = [0u8; 16];

    while code.len() < FRIEND_CODE_LEN {
        random::fill(rng, &mut buf)?;
        for byte in buf.iter().copied().filter(|b| *b < ACCEPT_BELOW) {
            code.push(ALPHABET[usize::from(byte % 36)] as char);
            if code.len() == FRIEND_CODE_LEN {
                break;
            }
        }
    }

    Ok(code)
}

/// Canonical form of user-entered codes.
pub fn normalize_friend_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

pub fn is_well_formed(code: &str) -> bool {
    code.len() == FRIEND_CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ring::rand::SystemRandom;

    #[test]
    fn test_generated_codes_are_well_formed() {
        let rng = SystemRandom::new();
        for _ in 0..1_000 {
            let code = generate_friend_code(&rng).unwrap();
            assert!(is_well_formed(&code), "bad code {code}");
        }
    }

    #[test]
    fn test_all_symbols_reachable() {
        let rng = SystemRandom::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2_000 {
            seen.extend(generate_friend_code(&rng).unwrap().bytes());
        }
        assert_eq!(seen.len(), ALPHABET.len());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_friend_code("  ab1c9 "), "AB1C9");
        assert!(!is_well_formed("AB1C"));
        assert!(!is_well_formed("AB-C9"));
    }
}
