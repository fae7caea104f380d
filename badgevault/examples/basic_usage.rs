//! Basic usage example for `BadgeVault`.

use badgevault::prelude::*;
use badgevault_key_file::FileKeyProvider;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("BadgeVault Basic Usage Example");
    println!("==============================\n");

    let work_dir = PathBuf::from("./example_vault");
    let config = VaultConfig::default()
        .with_key_file(work_dir.join("example.key"))
        .with_storage_file(work_dir.join("example_records.json"));

    // The key file is generated on first use and reused afterwards
    let provider = FileKeyProvider::new(config.key_file());
    let encryptor = FieldEncryptor::new(&provider)?;
    println!("✓ Encryptor ready (key: {})\n", config.key_file().display());

    let mut store = RecordStore::open(config.storage_file(), encryptor);

    let officer = SensitiveRecord::new("MH-CYB-2024-001")
        .with_name("Priya Sharma")
        .with_email("priya.sharma@example.gov")
        .with_phone("+91 98765 43210")
        .with_rank("Sub Inspector")
        .with_active(true);

    let key = store.save(&officer)?;
    println!("✓ Saved under search hash {key}");
    println!("  Records stored: {}\n", store.count());

    if let Some(protected) = store.get_protected("MH-CYB-2024-001") {
        println!("As stored:");
        println!("  name_encrypted:  {}", protected.name_encrypted);
        println!("  email_encrypted: {}", protected.email_encrypted);
        println!("  badge_id_hash:   {}\n", protected.badge_id_hash.as_deref().unwrap_or(""));
    }

    if let Some(revealed) = store.get_revealed("MH-CYB-2024-001") {
        println!("Revealed:");
        println!("  name:  {}", revealed.name);
        println!("  email: {}", revealed.email);
        println!("  phone: {}\n", revealed.phone);
    }

    // The search hash needs no key
    assert_eq!(hash_identifier("MH-CYB-2024-001"), key);
    println!("✓ Search hash recomputed without the key\n");

    println!("==============================");
    println!("Note: {} holds the only key; delete it and the records are gone", work_dir.display());

    Ok(())
}
