/// Bearer token generation
///
/// Tokens are opaque 40-character hex strings generated from 20 random
/// bytes. They are stored as-is (one row per user) so a repeated login can
/// return the same token; they are not digests of anything.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::token::{generate_token, validate_token_format, TOKEN_LENGTH};
///
/// let token = generate_token();
/// assert_eq!(token.len(), TOKEN_LENGTH);
/// assert!(validate_token_format(&token));
/// ```

use rand::RngCore;

/// Number of random bytes per token
const TOKEN_BYTES: usize = 20;

/// Total length of a token in hex characters
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generates a new opaque bearer token
///
/// Uses `rand::thread_rng()` (OS-seeded) for cryptographic randomness.
/// Token space: 2^160 combinations.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Checks that a string has the shape of a token
///
/// Used to reject obviously malformed credentials before the database
/// lookup.
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_token_randomness() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn test_validate_token_format() {
        assert!(validate_token_format(&generate_token()));

        assert!(!validate_token_format(""));
        assert!(!validate_token_format("short"));
        assert!(!validate_token_format(&"g".repeat(TOKEN_LENGTH)));
        assert!(!validate_token_format(&"a".repeat(TOKEN_LENGTH + 1)));
    }
}
