//! # `BadgeVault`
//!
//! Field-level encryption for personnel records, with a searchable hash
//! index and a flat-file record store.
//!
//! ## Features
//!
//! - AEAD field encryption (ChaCha20-Poly1305), non-deterministic tokens
//! - Search hash (SHA-256) of the badge identifier for lookup without decryption
//! - Allow-listed record model: four sensitive fields, five plain fields
//! - Per-field failure isolation on decryption
//! - JSON record store with atomic full rewrites
//!
//! ## Example
//!
//! ```rust,ignore
//! use badgevault::prelude::*;
//! use badgevault_key_file::FileKeyProvider;
//!
//! let config = VaultConfig::default();
//! let encryptor = FieldEncryptor::new(&FileKeyProvider::new(config.key_file()))?;
//! let mut store = RecordStore::open(config.storage_file(), encryptor);
//!
//! store.save(&SensitiveRecord::new("TEST-001").with_name("Test Officer"))?;
//! let officer = store.get_revealed("TEST-001");
//! ```

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod encryptor;
pub mod error;
pub mod key_provider;
pub mod record;
pub mod search_hash;
pub mod store;
pub mod token;

pub mod prelude {
    //! Convenience re-exports for common use.
    pub use crate::config::VaultConfig;
    pub use crate::encryptor::FieldEncryptor;
    pub use crate::error::{Error, KeyProviderError};
    pub use crate::key_provider::KeyProvider;
    pub use crate::record::{ProtectedRecord, RecordView, RevealedRecord, SensitiveRecord};
    pub use crate::search_hash::hash_identifier;
    pub use crate::store::RecordStore;
}
