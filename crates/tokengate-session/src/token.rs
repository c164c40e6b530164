//! Session token generation.

use rand::Rng;

/// Length of every session token.
pub const TOKEN_LEN: usize = 24;

/// The token alphabet: 62 alphanumeric characters.
const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates a random 24-character alphanumeric session token.
///
/// The thread-local rng is a CSPRNG, and `random_range` draws without
/// modulo bias, so every one of the 62^24 (~2^142) tokens is equally
/// likely. No uniqueness check is made anywhere — at that keyspace a
/// collision is treated as negligible, and a reissued token simply
/// overwrites the binding's session slot anyway.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_has_fixed_length() {
        assert_eq!(generate_token().len(), TOKEN_LEN);
    }

    #[test]
    fn test_generate_token_uses_alphanumeric_alphabet_only() {
        let token = generate_token();
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_token_is_not_constant() {
        // Not a randomness test — just a guard against the generator
        // degenerating into a fixed string.
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
    }
}
