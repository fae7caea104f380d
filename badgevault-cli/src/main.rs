//! `BadgeVault` CLI tool for protected record operations.

#![warn(clippy::pedantic, clippy::nursery)]

use anyhow::{bail, Context, Result};
use badgevault::prelude::*;
use badgevault::config::{DEFAULT_KEY_FILE, DEFAULT_STORAGE_FILE};
use badgevault_key_file::FileKeyProvider;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "badgevault")]
#[command(about = "BadgeVault record protection CLI", long_about = None)]
struct Cli {
    /// Path to the key file (created on first use)
    #[arg(long, global = true, default_value = DEFAULT_KEY_FILE)]
    key_file: PathBuf,

    /// Path to the encrypted record store
    #[arg(long, global = true, default_value = DEFAULT_STORAGE_FILE)]
    storage: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key file
    Keygen,
    /// Encrypt and save a record
    Save(SaveArgs),
    /// Show one record
    Get {
        /// Badge identifier
        badge_id: String,
        /// Show the record as stored instead of decrypting it
        #[arg(long)]
        encrypted: bool,
    },
    /// Show every record
    List {
        /// Show records as stored instead of decrypting them
        #[arg(long)]
        encrypted: bool,
    },
    /// Delete a record
    Delete {
        /// Badge identifier
        badge_id: String,
    },
    /// Print the number of stored records
    Count,
    /// Print the search hash of a badge identifier
    Hash {
        /// Badge identifier
        badge_id: String,
    },
    /// Save sample officers and walk through the stored and revealed views
    Demo,
}

#[derive(Args)]
struct SaveArgs {
    /// Read the record from a JSON file instead of flags
    #[arg(
        long,
        conflicts_with_all = [
            "badge_id", "name", "phone", "email",
            "rank", "designation", "station_id", "active", "verified",
        ]
    )]
    json: Option<PathBuf>,
    #[arg(long)]
    badge_id: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    rank: Option<String>,
    #[arg(long)]
    designation: Option<String>,
    #[arg(long)]
    station_id: Option<String>,
    #[arg(long)]
    active: Option<bool>,
    #[arg(long)]
    verified: Option<bool>,
}

impl SaveArgs {
    fn into_record(self) -> Result<SensitiveRecord> {
        if let Some(path) = self.json {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()));
        }

        let mut record = SensitiveRecord {
            name: self.name,
            phone: self.phone,
            email: self.email,
            badge_id: self.badge_id,
            ..SensitiveRecord::default()
        };
        if let Some(rank) = self.rank {
            record = record.with_rank(rank);
        }
        if let Some(designation) = self.designation {
            record = record.with_designation(designation);
        }
        if let Some(station_id) = self.station_id {
            record = record.with_station_id(station_id);
        }
        if let Some(active) = self.active {
            record = record.with_active(active);
        }
        if let Some(verified) = self.verified {
            record = record.with_verified(verified);
        }
        Ok(record)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = VaultConfig::new(&cli.key_file, &cli.storage);

    match cli.command {
        Commands::Keygen => {
            FileKeyProvider::init(config.key_file()).context("generating key file")?;
            println!("Generated key file: {}", config.key_file().display());
        }
        Commands::Hash { badge_id } => {
            println!("{}", hash_identifier(&badge_id));
        }
        Commands::Save(args) => {
            let record = args.into_record()?;
            let mut store = open_store(&config)?;
            let key = store.save(&record).context("saving record")?;
            println!("Saved record {key}");
        }
        Commands::Get { badge_id, encrypted } => {
            let store = open_store(&config)?;
            let Some(view) = store.get(&badge_id, !encrypted) else {
                eprintln!("Record not found: {badge_id}");
                return Ok(ExitCode::FAILURE);
            };
            print_json(&view)?;
        }
        Commands::List { encrypted } => {
            let store = open_store(&config)?;
            print_json(&store.list(!encrypted))?;
        }
        Commands::Delete { badge_id } => {
            let mut store = open_store(&config)?;
            if !store.delete(&badge_id).context("deleting record")? {
                eprintln!("Record not found: {badge_id}");
                return Ok(ExitCode::FAILURE);
            }
            println!("Deleted record: {badge_id}");
        }
        Commands::Count => {
            let store = open_store(&config)?;
            println!("{}", store.count());
        }
        Commands::Demo => demo(&config)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn open_store(config: &VaultConfig) -> Result<RecordStore> {
    let provider = FileKeyProvider::new(config.key_file());
    let encryptor = FieldEncryptor::new(&provider)
        .with_context(|| format!("loading key from {}", config.key_file().display()))?;
    Ok(RecordStore::open(config.storage_file(), encryptor))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn demo(config: &VaultConfig) -> Result<()> {
    let mut store = open_store(config)?;

    let officers = [
        SensitiveRecord::new("MH-CYB-2024-001")
            .with_name("Priya Sharma")
            .with_email("priya.sharma@mhpolice.gov.in")
            .with_phone("+91 98765 43210")
            .with_rank("Sub Inspector")
            .with_designation("Cyber Crime Investigator")
            .with_active(true)
            .with_verified(true),
        SensitiveRecord::new("MH-CYB-2024-002")
            .with_name("Rahul Verma")
            .with_email("rahul.verma@mhpolice.gov.in")
            .with_phone("+91 98765 12345")
            .with_rank("Assistant Sub Inspector")
            .with_designation("Field Officer")
            .with_active(true)
            .with_verified(true),
        SensitiveRecord::new("DL-CYB-2024-001")
            .with_name("Amit Patil")
            .with_email("amit.patil@delhipolice.gov.in")
            .with_phone("+91 99887 76543")
            .with_rank("Sub Inspector")
            .with_designation("Cyber Crime Unit")
            .with_active(true)
            .with_verified(true),
    ];

    println!("Step 1: saving officers with encryption");
    for officer in &officers {
        store.save(officer).context("saving demo officer")?;
    }
    println!("Total officers saved: {}\n", store.count());

    println!("Step 2: retrieving officer (decrypted)");
    let Some(officer) = store.get_revealed("MH-CYB-2024-001") else {
        bail!("demo officer missing after save");
    };
    println!("  Name:     {}", officer.name);
    println!("  Badge ID: {}", officer.badge_id);
    println!("  Email:    {}", officer.email);
    println!("  Phone:    {}\n", officer.phone);

    println!("Step 3: viewing the record as stored");
    if let Some(protected) = store.get_protected("MH-CYB-2024-001") {
        println!("  name_encrypted:  {}...", preview(&protected.name_encrypted));
        println!("  email_encrypted: {}...", preview(&protected.email_encrypted));
        println!("  phone_encrypted: {}...", preview(&protected.phone_encrypted));
        println!("  badge_id_hash:   {}\n", protected.badge_id_hash.as_deref().unwrap_or(""));
    }

    println!("Step 4: listing all officers");
    for (i, officer) in
        store.list(true).into_iter().filter_map(RecordView::into_revealed).enumerate()
    {
        println!("  {}. {} ({})", i + 1, officer.name, officer.badge_id);
    }

    Ok(())
}

fn preview(token: &str) -> &str {
    token.get(..50).unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_save_json_conflicts_with_field_flags() {
        for flag in [
            ["--badge-id", "A-1"],
            ["--rank", "Inspector"],
            ["--designation", "Field Officer"],
            ["--station-id", "7"],
            ["--active", "true"],
            ["--verified", "false"],
        ] {
            let result =
                Cli::try_parse_from(["badgevault", "save", "--json", "officer.json", flag[0], flag[1]]);
            let err = result.err().unwrap_or_else(|| panic!("{} accepted with --json", flag[0]));
            assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
        }
    }

    #[test]
    fn test_save_flags_build_record() {
        let cli = Cli::try_parse_from([
            "badgevault", "save", "--badge-id", "A-1", "--name", "Priya Sharma", "--active", "true",
        ])
        .unwrap();
        let Commands::Save(args) = cli.command else { panic!("expected save") };

        let record = args.into_record().unwrap();
        assert_eq!(record.badge_id(), Some("A-1"));
        assert_eq!(record.name.as_deref(), Some("Priya Sharma"));
        assert_eq!(record.plain.is_active, Some(serde_json::Value::Bool(true)));
    }
}
