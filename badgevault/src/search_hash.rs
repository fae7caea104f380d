//! Search hash for looking up records without decryption.
//!
//! The search hash is an unkeyed SHA-256 digest of the identifier. It trades
//! confidentiality (the identifier cannot be recovered from it) for
//! equality-testability (two hashes compare equal iff the identifiers do), so
//! the store can key records by it and find them without decrypting anything.
//! Being unkeyed, it is stable across processes and across key files.

use sha2::{Digest, Sha256};

/// Search hash output size in bytes.
pub const SEARCH_HASH_SIZE: usize = 32;

/// Computes the search hash of an identifier.
///
/// The hash is computed as `hex(SHA-256(utf8(identifier)))`: 64 lowercase
/// hex characters.
///
/// # Example
///
/// ```
/// use badgevault::search_hash::hash_identifier;
///
/// let h1 = hash_identifier("MH-CYB-2024-001");
/// let h2 = hash_identifier("MH-CYB-2024-001");
///
/// assert_eq!(h1, h2);
/// assert_eq!(h1.len(), 64);
/// ```
#[must_use]
pub fn hash_identifier(identifier: &str) -> String {
    hex::encode(Sha256::digest(identifier.as_bytes()))
}

/// Returns `true` if `value` has the shape of a search hash.
#[must_use]
pub fn is_search_hash(value: &str) -> bool {
    value.len() == SEARCH_HASH_SIZE * 2
        && value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_search_hash_known_vector() {
        // SHA-256("abc"), FIPS 180-2 appendix B.1
        assert_eq!(
            hash_identifier("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_search_hash_length() {
        assert_eq!(hash_identifier("").len(), SEARCH_HASH_SIZE * 2);
        assert_eq!(hash_identifier(&"x".repeat(10_000)).len(), SEARCH_HASH_SIZE * 2);
    }

    #[test]
    fn test_search_hash_different_values() {
        assert_ne!(hash_identifier("TEST-001"), hash_identifier("TEST-002"));
    }

    #[test]
    fn test_search_hash_does_not_contain_identifier() {
        let hash = hash_identifier("deadbeef");
        assert!(!hash.contains("deadbeef"));
    }

    #[test]
    fn test_is_search_hash() {
        assert!(is_search_hash(&hash_identifier("x")));
        assert!(!is_search_hash("abc"));
        assert!(!is_search_hash(&hash_identifier("x").to_uppercase()));
        assert!(!is_search_hash(&"g".repeat(64)));
    }

    proptest! {
        #[test]
        fn prop_search_hash_deterministic(id in ".*") {
            let h1 = hash_identifier(&id);
            let h2 = hash_identifier(&id);
            prop_assert_eq!(&h1, &h2);
            prop_assert!(is_search_hash(&h1));
        }
    }
}
