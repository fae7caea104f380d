//! Field encryptor for protecting and revealing records.
//!
//! The encryptor holds the symmetric field key and performs three jobs:
//! 1. Encrypt/decrypt single text fields with ChaCha20-Poly1305
//! 2. Compute the search hash of the identifying field
//! 3. Transform whole records between plaintext and protected form

use crate::error::{Error, KeyProviderError};
use crate::key_provider::{KeyProvider, FIELD_KEY_SIZE};
use crate::record::{
    decryption_error_marker, ProtectedRecord, RevealedRecord, SensitiveRecord, ENCRYPTION_VERSION,
};
use crate::search_hash;
use crate::token::{associated_data_for, FieldToken, NONCE_SIZE};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chacha20poly1305::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    ChaCha20Poly1305, Nonce,
};
use secrecy::{ExposeSecret, SecretVec};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

/// Encrypts sensitive fields and computes search hashes.
///
/// Encryption is non-deterministic: every call draws a fresh random nonce and
/// stamps the current time into the token, so encrypting the same value twice
/// yields two different tokens. Tokens are URL-safe base64 without padding.
///
/// # Example
///
/// ```ignore
/// use badgevault::encryptor::FieldEncryptor;
/// use badgevault_key_file::FileKeyProvider;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = FileKeyProvider::new("./badgevault.key");
/// let encryptor = FieldEncryptor::new(&provider)?;
///
/// let token = encryptor.encrypt_field("Priya Sharma")?;
/// assert_eq!(encryptor.decrypt_field(&token)?, "Priya Sharma");
/// # Ok(())
/// # }
/// ```
pub struct FieldEncryptor {
    key: SecretVec<u8>,
    encrypted_at: String,
}

impl FieldEncryptor {
    /// Creates an encryptor with the key supplied by `provider`.
    ///
    /// The key is generated and persisted by the provider on first use. The
    /// `encrypted_at` stamp is taken from the key's modification time.
    ///
    /// # Errors
    ///
    /// Returns error if the provider fails or the key is not 32 bytes.
    pub fn new<P: KeyProvider + ?Sized>(provider: &P) -> Result<Self, Error> {
        let key = provider.load_or_create()?;
        let encrypted_at = provider.key_modified_at()?.map(unix_seconds).unwrap_or_default();
        Self::with_stamp(key, encrypted_at)
    }

    /// Creates an encryptor from raw key material, with an empty `encrypted_at` stamp.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not 32 bytes.
    pub fn from_key(key: SecretVec<u8>) -> Result<Self, Error> {
        Self::with_stamp(key, String::new())
    }

    fn with_stamp(key: SecretVec<u8>, encrypted_at: String) -> Result<Self, Error> {
        let len = key.expose_secret().len();
        if len != FIELD_KEY_SIZE {
            return Err(KeyProviderError::InvalidKey(format!(
                "expected {FIELD_KEY_SIZE} bytes, got {len}"
            ))
            .into());
        }
        Ok(Self { key, encrypted_at })
    }

    /// Returns the stamp written into `encrypted_at` of every protected record.
    #[must_use]
    pub fn encrypted_at(&self) -> &str {
        &self.encrypted_at
    }

    /// Encrypts one field value.
    ///
    /// An empty value yields an empty token without touching the cipher.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` if the cipher fails.
    pub fn encrypt_field(&self, plaintext: &str) -> Result<String, Error> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let cipher = ChaCha20Poly1305::new_from_slice(self.key.expose_secret())
            .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
        let aad = associated_data_for(timestamp);

        let ciphertext = cipher
            .encrypt(
                &Nonce::from(nonce_bytes),
                Payload { msg: plaintext.as_bytes(), aad: &aad },
            )
            .map_err(|e| {
                Error::EncryptionFailed(format!("ChaCha20-Poly1305 encryption failed: {e}"))
            })?;

        let token = FieldToken::new(timestamp, nonce_bytes, ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(token.to_bytes()))
    }

    /// Decrypts one field token.
    ///
    /// An empty token yields an empty value.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The token is not valid base64 or is structurally malformed
    /// - The token was produced under a different key or was tampered with
    ///   (`Error::AuthenticationFailed`)
    /// - The plaintext is not UTF-8
    pub fn decrypt_field(&self, token: &str) -> Result<String, Error> {
        if token.is_empty() {
            return Ok(String::new());
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| Error::DecryptionFailed(format!("Invalid token encoding: {e}")))?;
        let token = FieldToken::from_bytes(&bytes)?;

        let cipher = ChaCha20Poly1305::new_from_slice(self.key.expose_secret())
            .map_err(|e| Error::DecryptionFailed(format!("Invalid key: {e}")))?;

        let plaintext = cipher
            .decrypt(
                &Nonce::from(*token.nonce()),
                Payload { msg: token.ciphertext(), aad: &token.associated_data() },
            )
            .map_err(|_| Error::AuthenticationFailed)?;

        String::from_utf8(plaintext)
            .map_err(|e| Error::DecryptionFailed(format!("Invalid UTF-8 plaintext: {e}")))
    }

    /// Computes the search hash of an identifier. See [`search_hash::hash_identifier`].
    #[must_use]
    pub fn hash_identifier(&self, identifier: &str) -> String {
        search_hash::hash_identifier(identifier)
    }

    /// Converts a plaintext record into its protected form.
    ///
    /// Sensitive fields become `<field>_encrypted` tokens (`""` when absent),
    /// `badge_id_hash` is set when the record has a `badge_id`, plain fields are
    /// copied and the version/timestamp metadata is stamped.
    ///
    /// # Errors
    ///
    /// Returns error if encrypting any field fails.
    pub fn protect_record(&self, record: &SensitiveRecord) -> Result<ProtectedRecord, Error> {
        Ok(ProtectedRecord {
            name_encrypted: self.encrypt_field(record.name.as_deref().unwrap_or_default())?,
            phone_encrypted: self.encrypt_field(record.phone.as_deref().unwrap_or_default())?,
            email_encrypted: self.encrypt_field(record.email.as_deref().unwrap_or_default())?,
            badge_id_encrypted: self.encrypt_field(record.badge_id().unwrap_or_default())?,
            badge_id_hash: record.badge_id().map(search_hash::hash_identifier),
            plain: record.plain.clone(),
            encryption_version: ENCRYPTION_VERSION.to_string(),
            encrypted_at: self.encrypted_at.clone(),
        })
    }

    /// Converts a protected record back to plaintext.
    ///
    /// A field that fails to decrypt does not fail the record: it is replaced
    /// by an inline decryption-error marker and the other fields still
    /// decrypt.
    #[must_use]
    pub fn reveal_record(&self, protected: &ProtectedRecord) -> RevealedRecord {
        RevealedRecord {
            name: self.reveal_field("name", &protected.name_encrypted),
            phone: self.reveal_field("phone", &protected.phone_encrypted),
            email: self.reveal_field("email", &protected.email_encrypted),
            badge_id: self.reveal_field("badge_id", &protected.badge_id_encrypted),
            plain: protected.plain.clone(),
        }
    }

    fn reveal_field(&self, field: &str, token: &str) -> String {
        self.decrypt_field(token).unwrap_or_else(|err| {
            warn!(field, error = %err, "field decryption failed");
            decryption_error_marker(err)
        })
    }
}

fn unix_seconds(time: SystemTime) -> String {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_secs_f64().to_string()).unwrap_or_default()
}
