//! Key provider abstraction for the field key.

use crate::error::KeyProviderError;
use secrecy::SecretVec;
use std::time::SystemTime;

/// Size of the symmetric field key in bytes (256 bits).
pub const FIELD_KEY_SIZE: usize = 32;

/// Supplies the symmetric key used for field encryption.
///
/// A provider moves from "no key" to "key present" exactly once: the first
/// call to [`load_or_create`](Self::load_or_create) generates and persists
/// the key, and every later call (in this or any other process pointed at the
/// same backing store) returns the same bytes.
///
/// # Example
///
/// ```rust,ignore
/// use badgevault::key_provider::KeyProvider;
///
/// struct MyProvider;
///
/// impl KeyProvider for MyProvider {
///     fn load_or_create(&self) -> Result<SecretVec<u8>, KeyProviderError> {
///         // Implementation
///     }
/// }
/// ```
pub trait KeyProvider: Send + Sync {
    /// Returns the field key, generating and persisting it on first use.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::CreationFailed` if a new key cannot be
    /// persisted, or `KeyProviderError::InvalidKey` if the stored key is
    /// malformed.
    fn load_or_create(&self) -> Result<SecretVec<u8>, KeyProviderError>;

    /// Returns the last-modified time of the key material, if known.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::Io` if the backing store cannot be inspected.
    fn key_modified_at(&self) -> Result<Option<SystemTime>, KeyProviderError> {
        Ok(None)
    }
}
