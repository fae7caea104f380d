//! Integration tests for badgevault with FileKeyProvider.

use badgevault::encryptor::FieldEncryptor;
use badgevault::error::Error;
use badgevault::record::{is_decryption_error, RecordView, SensitiveRecord};
use badgevault::search_hash::hash_identifier;
use badgevault::store::RecordStore;
use badgevault_key_file::FileKeyProvider;
use serde_json::json;
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> RecordStore {
    let provider = FileKeyProvider::new(dir.path().join("test_key.key"));
    let encryptor = FieldEncryptor::new(&provider).expect("Failed to create encryptor");
    RecordStore::open(dir.path().join("test_officers.json"), encryptor)
}

#[test]
fn test_end_to_end_officer_scenario() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = open_store(&temp_dir);

    let officer = SensitiveRecord::new("TEST-001")
        .with_name("Test Officer")
        .with_email("test@example.com")
        .with_phone("1234567890");

    store.save(&officer).expect("Failed to save officer");
    assert_eq!(store.count(), 1);

    let revealed = store.get_revealed("TEST-001").expect("Officer not found");
    assert_eq!(revealed.name, "Test Officer");

    let protected = store.get("TEST-001", false).and_then(RecordView::into_protected);
    let protected = protected.expect("Officer not found");
    assert!(!protected.name_encrypted.is_empty());
    assert_ne!(protected.name_encrypted, "Test Officer");

    assert!(store.delete("TEST-001").expect("Failed to delete officer"));
    assert_eq!(store.count(), 0);
}

#[test]
fn test_key_persists_across_encryptors() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let key_file = temp_dir.path().join("test_key.key");

    let first = FieldEncryptor::new(&FileKeyProvider::new(&key_file)).expect("first encryptor");
    let second = FieldEncryptor::new(&FileKeyProvider::new(&key_file)).expect("second encryptor");

    let token = first.encrypt_field("priya.sharma@example.gov").expect("Encryption failed");
    assert_eq!(second.decrypt_field(&token).expect("Decryption failed"), "priya.sharma@example.gov");

    let token = second.encrypt_field("+91 98765 43210").expect("Encryption failed");
    assert_eq!(first.decrypt_field(&token).expect("Decryption failed"), "+91 98765 43210");

    // Both encryptors stamp records with the same key file time
    assert_eq!(first.encrypted_at(), second.encrypted_at());
    assert!(!first.encrypted_at().is_empty());
}

#[test]
fn test_records_survive_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    {
        let mut store = open_store(&temp_dir);
        let officer = SensitiveRecord::new("TEST-002")
            .with_name("John Doe")
            .with_email("john.doe@test.gov.in")
            .with_phone("9876543210")
            .with_rank("Inspector")
            .with_active(true);
        store.save(&officer).expect("Failed to save officer");
    }

    let store = open_store(&temp_dir);
    assert_eq!(store.count(), 1);

    let revealed = store.get_revealed("TEST-002").expect("Officer not found");
    assert_eq!(revealed.name, "John Doe");
    assert_eq!(revealed.phone, "9876543210");
    assert_eq!(revealed.plain.rank, Some(json!("Inspector")));
    assert_eq!(revealed.plain.is_active, Some(json!(true)));

    let protected = store.get_protected("TEST-002").expect("Officer not found");
    assert_eq!(protected.badge_id_hash.as_deref(), Some(hash_identifier("TEST-002").as_str()));
}

#[test]
fn test_overwrite_and_missing_identifier() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = open_store(&temp_dir);

    store.save(&SensitiveRecord::new("DL-CYB-2024-001").with_name("Amit Patil")).unwrap();
    store.save(&SensitiveRecord::new("DL-CYB-2024-001").with_name("Amit R. Patil")).unwrap();
    assert_eq!(store.count(), 1);
    assert_eq!(store.get_revealed("DL-CYB-2024-001").unwrap().name, "Amit R. Patil");

    let result = store.save(&SensitiveRecord::default().with_name("Anonymous"));
    assert!(matches!(result, Err(Error::MissingIdentifier)));
    assert_eq!(store.count(), 1);

    assert!(store.get("nonexistent", true).is_none());
}

#[test]
fn test_foreign_key_file_yields_markers() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = temp_dir.path().join("officers.json");

    {
        let provider = FileKeyProvider::new(temp_dir.path().join("a.key"));
        let mut store = RecordStore::open(&storage, FieldEncryptor::new(&provider).unwrap());
        store
            .save(&SensitiveRecord::new("MH-CYB-2024-002").with_name("Rahul Verma").with_verified(true))
            .unwrap();
    }

    let provider = FileKeyProvider::new(temp_dir.path().join("b.key"));
    let store = RecordStore::open(&storage, FieldEncryptor::new(&provider).unwrap());

    // Lookup by hash still works without the right key
    let revealed = store.get_revealed("MH-CYB-2024-002").expect("Officer not found");
    assert!(is_decryption_error(&revealed.name));
    assert!(is_decryption_error(&revealed.badge_id));
    assert_eq!(revealed.email, "");
    assert_eq!(revealed.plain.is_verified, Some(json!(true)));
}

#[test]
fn test_save_from_json_applies_allow_list() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = open_store(&temp_dir);

    let record: SensitiveRecord = serde_json::from_value(json!({
        "badge_id": "MH-CYB-2024-001",
        "name": "Priya Sharma",
        "phone": 919_876_543_210_u64,
        "designation": "Cyber Crime Investigator",
        "station_id": 4,
        "ssn": "000-00-0000"
    }))
    .unwrap();
    store.save(&record).unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(!text.contains("ssn"));
    assert!(!text.contains("Priya"));

    let revealed = store.get_revealed("MH-CYB-2024-001").unwrap();
    assert_eq!(revealed.phone, "919876543210");
    assert_eq!(revealed.plain.station_id, Some(json!(4)));
}
