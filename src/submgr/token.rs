//! URI-safe random string tokens used as subscription identifiers.
//!
//! A token doubles as a bearer capability on the streaming endpoint, so
//! the bytes come from the operating system's CSPRNG.

use crate::submgr::SubError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes per token. Kept a multiple of 3 so the base64
/// encoding needs no padding.
pub const TOKEN_BYTES: usize = 18;

/// Generate a new random token: 24 characters from `[A-Za-z0-9_=-]`.
pub fn generate_token() -> Result<String, SubError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SubError::Rng(e.to_string()))?;
    Ok(URL_SAFE.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tokens_are_url_safe_and_fixed_length() {
        let token = generate_token().unwrap();
        assert_eq!(token.len(), 24);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '='));
    }

    #[test]
    fn consecutive_tokens_are_distinct() {
        let mut seen = HashSet::new();
        for _ in 0..10 {
            assert!(seen.insert(generate_token().unwrap()));
        }
    }
}
