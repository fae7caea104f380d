//! Binary format of an encrypted field token.
//!
//! A token carries everything needed to decrypt one field besides the key:
//! - Token version
//! - Timestamp of encryption
//! - Nonce
//! - Ciphertext with authentication tag
//!
//! The version and timestamp are bound into the AEAD tag as associated data,
//! so they cannot be altered without failing decryption.

use crate::error::Error;

/// Token format version.
pub const TOKEN_VERSION: u8 = 1;

/// Nonce size for ChaCha20-Poly1305 (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Size of the authenticated header: version + timestamp.
pub const HEADER_SIZE: usize = 1 + 8;

/// One encrypted field value.
///
/// Format:
/// ```text
/// [version:1][timestamp:8 big-endian][nonce:12][ciphertext||tag:N]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldToken {
    version: u8,
    timestamp: u64,
    nonce: [u8; NONCE_SIZE],
    ciphertext: Vec<u8>,
}

impl FieldToken {
    /// Creates a new token.
    ///
    /// # Arguments
    ///
    /// * `timestamp` - Unix seconds at encryption time
    /// * `nonce` - Random nonce used for this encryption
    /// * `ciphertext` - AEAD output, tag included
    #[must_use]
    pub fn new(timestamp: u64, nonce: [u8; NONCE_SIZE], ciphertext: Vec<u8>) -> Self {
        Self { version: TOKEN_VERSION, timestamp, nonce, ciphertext }
    }

    /// Returns the token version.
    #[must_use]
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Returns the encryption timestamp (unix seconds).
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns the nonce.
    #[must_use]
    pub const fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// Returns the ciphertext (tag included).
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Returns the associated data authenticated alongside the ciphertext.
    #[must_use]
    pub fn associated_data(&self) -> [u8; HEADER_SIZE] {
        header_bytes(self.version, self.timestamp)
    }

    /// Serializes the token to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + NONCE_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.associated_data());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Deserializes a token from bytes.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The data is empty or too short
    /// - The version is not supported
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let Some((&version, rest)) = data.split_first() else {
            return Err(Error::InvalidToken("Empty token data".to_string()));
        };

        if version != TOKEN_VERSION {
            return Err(Error::UnsupportedVersion {
                version,
                supported: TOKEN_VERSION.to_string(),
            });
        }

        if rest.len() < 8 {
            return Err(Error::InvalidToken("Timestamp truncated".to_string()));
        }
        let (timestamp_bytes, rest) = rest.split_at(8);
        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(timestamp_bytes);

        if rest.len() < NONCE_SIZE {
            return Err(Error::InvalidToken("Nonce truncated".to_string()));
        }
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        if ciphertext.len() < TAG_SIZE {
            return Err(Error::InvalidToken(format!(
                "Ciphertext too short: {} bytes (min: {TAG_SIZE})",
                ciphertext.len()
            )));
        }

        Ok(Self {
            version,
            timestamp: u64::from_be_bytes(timestamp),
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// Returns the associated data for a token written now with `timestamp`.
#[must_use]
pub fn associated_data_for(timestamp: u64) -> [u8; HEADER_SIZE] {
    header_bytes(TOKEN_VERSION, timestamp)
}

fn header_bytes(version: u8, timestamp: u64) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0] = version;
    header[1..].copy_from_slice(&timestamp.to_be_bytes());
    header
}
