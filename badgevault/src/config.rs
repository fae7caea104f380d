//! File locations for the key and the record store.

use std::path::{Path, PathBuf};

/// Default key file name.
pub const DEFAULT_KEY_FILE: &str = "badgevault.key";

/// Default storage file name.
pub const DEFAULT_STORAGE_FILE: &str = "records_encrypted.json";

/// Where the key and the protected records live.
///
/// # Example
///
/// ```
/// use badgevault::config::VaultConfig;
///
/// let config = VaultConfig::default().with_storage_file("/var/lib/badgevault/records.json");
/// assert_eq!(config.key_file().to_str(), Some("badgevault.key"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    key_file: PathBuf,
    storage_file: PathBuf,
}

impl VaultConfig {
    /// Creates a configuration with explicit paths.
    #[must_use]
    pub fn new(key_file: impl Into<PathBuf>, storage_file: impl Into<PathBuf>) -> Self {
        Self { key_file: key_file.into(), storage_file: storage_file.into() }
    }

    /// Sets the key file path.
    #[must_use]
    pub fn with_key_file(mut self, key_file: impl Into<PathBuf>) -> Self {
        self.key_file = key_file.into();
        self
    }

    /// Sets the storage file path.
    #[must_use]
    pub fn with_storage_file(mut self, storage_file: impl Into<PathBuf>) -> Self {
        self.storage_file = storage_file.into();
        self
    }

    /// Returns the key file path.
    #[must_use]
    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    /// Returns the storage file path.
    #[must_use]
    pub fn storage_file(&self) -> &Path {
        &self.storage_file
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_FILE, DEFAULT_STORAGE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = VaultConfig::default();
        assert_eq!(config.key_file(), Path::new(DEFAULT_KEY_FILE));
        assert_eq!(config.storage_file(), Path::new(DEFAULT_STORAGE_FILE));
    }

    #[test]
    fn test_builder_overrides() {
        let config = VaultConfig::default().with_key_file("k.key").with_storage_file("s.json");
        assert_eq!(config, VaultConfig::new("k.key", "s.json"));
    }
}
