//! Error types for `BadgeVault` operations.

use std::fmt;

/// Main error type for `BadgeVault` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Encryption operation failed
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption operation failed (malformed token or non-UTF-8 plaintext)
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// Authentication tag verification failed (token tampered or produced under another key)
    #[error("authentication failed: token may be corrupted, tampered or from another key")]
    AuthenticationFailed,

    /// Field token parsing failed
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Unsupported token version
    #[error("unsupported version: {version} (supported: {supported})")]
    UnsupportedVersion {
        /// The version found in the token
        version: u8,
        /// Supported versions
        supported: String,
    },

    /// The record has no `badge_id`, so it cannot be indexed
    #[error("record is missing the mandatory badge_id")]
    MissingIdentifier,

    /// Key provider operation failed
    #[error("key provider error: {0}")]
    KeyProvider(#[from] KeyProviderError),

    /// Storage file (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for the failures `decrypt_field` can raise on a bad token.
    #[must_use]
    pub const fn is_decryption_error(&self) -> bool {
        matches!(
            self,
            Self::DecryptionFailed(_)
                | Self::AuthenticationFailed
                | Self::InvalidToken(_)
                | Self::UnsupportedVersion { .. }
        )
    }
}

/// Errors specific to key provider operations.
#[derive(Debug)]
pub enum KeyProviderError {
    /// Key material not found
    KeyNotFound(String),

    /// Key creation failed
    CreationFailed(String),

    /// Stored key material is unusable (wrong length)
    InvalidKey(String),

    /// I/O operation failed
    Io(std::io::Error),
}

impl fmt::Display for KeyProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyNotFound(path) => write!(f, "key not found: {path}"),
            Self::CreationFailed(msg) => write!(f, "key creation failed: {msg}"),
            Self::InvalidKey(msg) => write!(f, "invalid key: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for KeyProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KeyProviderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decryption_error_class() {
        assert!(Error::AuthenticationFailed.is_decryption_error());
        assert!(Error::InvalidToken("short".to_string()).is_decryption_error());
        assert!(Error::UnsupportedVersion { version: 9, supported: "1".to_string() }
            .is_decryption_error());
        assert!(!Error::MissingIdentifier.is_decryption_error());
    }

    #[test]
    fn test_key_provider_error_display() {
        let err = KeyProviderError::InvalidKey("expected 32 bytes, got 4".to_string());
        assert_eq!(err.to_string(), "invalid key: expected 32 bytes, got 4");

        let wrapped = Error::from(err);
        assert!(wrapped.to_string().starts_with("key provider error:"));
    }
}
