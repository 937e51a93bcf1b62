//! Hashing helpers for values that must never be stored in clear text.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input and returns it as a hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash used to look up a refresh-token session by its JWT ID.
pub fn session_token_hash(jti: &str) -> String {
    sha256_hex(&format!("session:{}", jti))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hex() {
        let hash = sha256_hex("test");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_sha256_hex_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_session_token_hash_is_namespaced() {
        let jti = "0b7f0c7e-9a55-4c43-8f2b-7b5f0f6f1c11";
        assert_ne!(session_token_hash(jti), sha256_hex(jti));
        assert_eq!(session_token_hash(jti), session_token_hash(jti));
        assert_eq!(session_token_hash(jti).len(), 64);
    }
}
