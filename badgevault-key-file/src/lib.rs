//! File-based key provider for `BadgeVault`.
//!
//! The field key is stored as 32 raw bytes in a single file. The file is the
//! only secret: anyone holding it can decrypt every record, and losing it
//! makes every record unrecoverable.

#![warn(clippy::pedantic, clippy::nursery)]

use badgevault::error::KeyProviderError;
use badgevault::key_provider::{KeyProvider, FIELD_KEY_SIZE};
use rand::{rngs::OsRng, RngCore};
use secrecy::SecretVec;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::info;
use zeroize::Zeroizing;

/// File-based key provider.
///
/// The key file is created on first use (or explicitly with
/// [`FileKeyProvider::init`]) and never modified afterwards:
/// ```text
/// badgevault.key   (32 bytes, 0600 permissions)
/// ```
#[derive(Debug, Clone)]
pub struct FileKeyProvider {
    path: PathBuf,
}

impl FileKeyProvider {
    /// Creates a new `FileKeyProvider` for the key file at `path`.
    ///
    /// No I/O happens until the key is requested.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Generates a fresh key and writes it to `path`.
    ///
    /// # Errors
    ///
    /// Returns `KeyProviderError::CreationFailed` if a key file already exists
    /// at `path`, or an I/O error if writing fails.
    pub fn init(path: impl Into<PathBuf>) -> Result<Self, KeyProviderError> {
        let provider = Self::new(path);
        if provider.path.exists() {
            return Err(KeyProviderError::CreationFailed(format!(
                "Key file already exists: {}",
                provider.path.display()
            )));
        }
        provider.generate()?;
        Ok(provider)
    }

    /// Returns the key file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<SecretVec<u8>>, KeyProviderError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        if bytes.len() != FIELD_KEY_SIZE {
            return Err(KeyProviderError::InvalidKey(format!(
                "{}: expected {FIELD_KEY_SIZE} bytes, got {}",
                self.path.display(),
                bytes.len()
            )));
        }
        Ok(Some(SecretVec::new(bytes.to_vec())))
    }

    fn generate(&self) -> Result<SecretVec<u8>, KeyProviderError> {
        let mut key = Zeroizing::new(vec![0u8; FIELD_KEY_SIZE]);
        OsRng.fill_bytes(&mut key);

        write_key(&self.path, &key).map_err(|e| {
            KeyProviderError::CreationFailed(format!("{}: {e}", self.path.display()))
        })?;
        info!(path = %self.path.display(), "generated new field key");

        Ok(SecretVec::new(key.to_vec()))
    }
}

impl KeyProvider for FileKeyProvider {
    fn load_or_create(&self) -> Result<SecretVec<u8>, KeyProviderError> {
        match self.read()? {
            Some(key) => Ok(key),
            None => self.generate(),
        }
    }

    fn key_modified_at(&self) -> Result<Option<SystemTime>, KeyProviderError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Writes the key durably: temp file in the same directory, fsync, rename.
fn write_key(path: &Path, key: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    tmp.write_all(key)?;
    tmp.as_file().sync_all()?;
    tmp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}
