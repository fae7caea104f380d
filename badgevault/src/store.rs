//! File-backed store of protected records keyed by search hash.
//!
//! The whole store is one JSON document mapping `badge_id_hash` to the
//! protected record. It is read once when the store is opened and rewritten
//! in full after every mutation (temp file + atomic rename), so a crash never
//! leaves a partially written file behind.
//!
//! The store assumes a single writer. Two processes sharing one storage file
//! race on every write and the last writer wins without detection.

use crate::encryptor::FieldEncryptor;
use crate::error::Error;
use crate::record::{ProtectedRecord, RecordView, RevealedRecord, SensitiveRecord};
use crate::search_hash::is_search_hash;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, instrument, warn};

/// Keyed collection of protected records backed by a flat JSON file.
///
/// Records are encrypted on [`save`](Self::save) and decrypted on read.
/// Iteration follows insertion order; re-saving a record keeps its position.
///
/// A mutation whose write fails is rolled back in memory, so the in-memory
/// state always matches the last successful write.
///
/// Stored entries that are not records at all (not a JSON object) are not
/// visible through the store but are written back unchanged.
///
/// # Example
///
/// ```ignore
/// use badgevault::prelude::*;
/// use badgevault_key_file::FileKeyProvider;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let encryptor = FieldEncryptor::new(&FileKeyProvider::new("badgevault.key"))?;
/// let mut store = RecordStore::open("records_encrypted.json", encryptor);
///
/// store.save(&SensitiveRecord::new("TEST-001").with_name("Test Officer"))?;
/// let officer = store.get_revealed("TEST-001").expect("saved above");
/// assert_eq!(officer.name, "Test Officer");
/// # Ok(())
/// # }
/// ```
pub struct RecordStore {
    path: PathBuf,
    encryptor: FieldEncryptor,
    records: IndexMap<String, ProtectedRecord>,
    unreadable: IndexMap<String, Value>,
}

impl RecordStore {
    /// Opens the store at `path`, loading any existing records.
    ///
    /// A missing file yields an empty store. An unreadable or unparsable
    /// file also yields an empty store, with a warning; the next successful
    /// write replaces it.
    pub fn open(path: impl Into<PathBuf>, encryptor: FieldEncryptor) -> Self {
        let path = path.into();
        let (records, unreadable) = load_records(&path);
        debug!(
            path = %path.display(),
            count = records.len(),
            unreadable = unreadable.len(),
            "record store opened"
        );
        Self { path, encryptor, records, unreadable }
    }

    /// Returns the storage file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the encryptor used by this store.
    #[must_use]
    pub const fn encryptor(&self) -> &FieldEncryptor {
        &self.encryptor
    }

    /// Encrypts and stores a record, replacing any record with the same `badge_id`.
    ///
    /// Returns the storage key (the search hash of the `badge_id`).
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The record has no `badge_id` (`Error::MissingIdentifier`)
    /// - Encrypting a field fails
    /// - Writing the storage file fails (the in-memory change is rolled back)
    #[instrument(skip_all)]
    pub fn save(&mut self, record: &SensitiveRecord) -> Result<String, Error> {
        let Some(badge_id) = record.badge_id() else {
            warn!("refusing to save record without badge_id");
            return Err(Error::MissingIdentifier);
        };

        let protected = self.encryptor.protect_record(record)?;
        let key = self.encryptor.hash_identifier(badge_id);

        let previous = self.records.insert(key.clone(), protected);
        if let Err(err) = self.persist() {
            match previous {
                Some(previous) => {
                    self.records.insert(key, previous);
                }
                None => {
                    self.records.shift_remove(&key);
                }
            }
            error!(error = %err, "failed to persist record store");
            return Err(err);
        }

        info!(key = %key, replaced = previous.is_some(), "record saved");
        Ok(key)
    }

    /// Looks up a record by its identifier.
    ///
    /// With `reveal` the record is decrypted; without it the record is
    /// returned exactly as persisted. Returns `None` if no record matches.
    #[must_use]
    pub fn get(&self, identifier: &str, reveal: bool) -> Option<RecordView> {
        let key = self.encryptor.hash_identifier(identifier);
        let Some(protected) = self.records.get(&key) else {
            debug!(key = %key, "record not found");
            return None;
        };
        Some(self.view(protected, reveal))
    }

    /// Looks up and decrypts a record.
    #[must_use]
    pub fn get_revealed(&self, identifier: &str) -> Option<RevealedRecord> {
        self.get(identifier, true).and_then(RecordView::into_revealed)
    }

    /// Looks up a record without decrypting it.
    #[must_use]
    pub fn get_protected(&self, identifier: &str) -> Option<&ProtectedRecord> {
        self.records.get(&self.encryptor.hash_identifier(identifier))
    }

    /// Returns every record in storage order.
    ///
    /// Fields that fail to decrypt carry an inline error marker; they never
    /// stop the listing.
    #[must_use]
    pub fn list(&self, reveal: bool) -> Vec<RecordView> {
        self.records.values().map(|protected| self.view(protected, reveal)).collect()
    }

    /// Removes a record by its identifier.
    ///
    /// Returns `Ok(false)` if no record matches.
    ///
    /// # Errors
    ///
    /// Returns error if writing the storage file fails (the record is restored
    /// in memory).
    #[instrument(skip_all)]
    pub fn delete(&mut self, identifier: &str) -> Result<bool, Error> {
        let key = self.encryptor.hash_identifier(identifier);
        let Some((index, key, removed)) = self.records.shift_remove_full(&key) else {
            debug!(key = %key, "record not found");
            return Ok(false);
        };

        if let Err(err) = self.persist() {
            self.records.shift_insert(index, key, removed);
            error!(error = %err, "failed to persist record store");
            return Err(err);
        }

        info!(key = %key, "record deleted");
        Ok(true)
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if a record with this identifier is stored.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(&self.encryptor.hash_identifier(identifier))
    }

    fn view(&self, protected: &ProtectedRecord, reveal: bool) -> RecordView {
        if reveal {
            RecordView::Revealed(self.encryptor.reveal_record(protected))
        } else {
            RecordView::Protected(protected.clone())
        }
    }

    fn persist(&self) -> Result<(), Error> {
        let mut document: IndexMap<&str, Value> =
            IndexMap::with_capacity(self.records.len() + self.unreadable.len());
        for (key, record) in &self.records {
            document.insert(key, serde_json::to_value(record)?);
        }
        for (key, raw) in &self.unreadable {
            document.entry(key).or_insert_with(|| raw.clone());
        }
        let json = serde_json::to_vec_pretty(&document)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

type Loaded = (IndexMap<String, ProtectedRecord>, IndexMap<String, Value>);

/// Reads the storage file into records plus the entries that are not records.
fn load_records(path: &Path) -> Loaded {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Loaded::default(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read record store, starting empty");
            return Loaded::default();
        }
    };

    let raw: IndexMap<String, Value> = match serde_json::from_slice(&bytes) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot parse record store, starting empty");
            return Loaded::default();
        }
    };

    let mut records = IndexMap::with_capacity(raw.len());
    let mut unreadable = IndexMap::new();
    for (key, value) in raw {
        if !is_search_hash(&key) {
            warn!(key = %key, "storage key is not a search hash");
        }
        if !value.is_object() {
            warn!(key = %key, "storage entry is not a record, keeping it as is");
            unreadable.insert(key, value);
            continue;
        }
        match ProtectedRecord::deserialize(&value) {
            Ok(record) => {
                records.insert(key, record);
            }
            Err(err) => {
                warn!(key = %key, error = %err, "malformed record, keeping it as is");
                unreadable.insert(key, value);
            }
        }
    }
    (records, unreadable)
}
