//! Short prefixed identifiers and content hashing
//!
//! Ids are 8 random bytes, hex-encoded, behind an entity prefix
//! (`jdg_`, `blk_`, `pat_`, ...). `item_hash` is the SHA-256 of the
//! canonical content text and defines the dedup equivalence class.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Entity prefixes for short ids
pub mod prefix {
    pub const JUDGMENT: &str = "jdg";
    pub const BLOCK: &str = "blk";
    pub const PATTERN: &str = "pat";
    pub const FACT: &str = "fct";
    pub const CYCLE: &str = "cyc";
    pub const FEEDBACK: &str = "fbk";
    pub const SESSION: &str = "ses";
    pub const LEARNER: &str = "lrn";
}

/// Generate a short prefixed id: `{prefix}_{16 hex chars}`
pub fn short_id(prefix: &str) -> String {
    let mut bytes = [0u8; 8];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}_{}", prefix, hex::encode(bytes))
}

/// SHA-256 of a string, hex-encoded
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical content hash for judgment deduplication
pub fn item_hash(content: &str) -> String {
    sha256_hex(content.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = short_id(prefix::JUDGMENT);
        assert!(id.starts_with("jdg_"));
        assert_eq!(id.len(), 4 + 16);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_ids_are_unique() {
        let a = short_id(prefix::BLOCK);
        let b = short_id(prefix::BLOCK);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sha256_known_vector() {
        // sha256("abc")
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_item_hash_canonicalizes_whitespace() {
        assert_eq!(item_hash("  abc  "), item_hash("abc"));
    }
}
