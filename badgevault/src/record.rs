//! Record types: plaintext input, protected (persisted) form and revealed form.
//!
//! The set of recognized keys is an allow-list. Deserializing a
//! [`SensitiveRecord`] from arbitrary JSON keeps the four sensitive keys and
//! the five plain keys and silently drops everything else.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Version tag stamped on every protected record.
pub const ENCRYPTION_VERSION: &str = "1.0";

/// Prefix of the inline marker left in a field that failed to decrypt.
pub const DECRYPTION_ERROR_PREFIX: &str = "[DECRYPTION_ERROR: ";

/// Builds the inline marker for a field that could not be decrypted.
#[must_use]
pub fn decryption_error_marker(detail: impl std::fmt::Display) -> String {
    format!("{DECRYPTION_ERROR_PREFIX}{detail}]")
}

/// Returns `true` if `value` is an inline decryption-error marker.
#[must_use]
pub fn is_decryption_error(value: &str) -> bool {
    value.starts_with(DECRYPTION_ERROR_PREFIX) && value.ends_with(']')
}

/// Non-sensitive fields, copied through protection and reveal unchanged.
///
/// Values keep their JSON type. A key that is present with `null` stays
/// present; a key that is absent stays absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainFields {
    /// Whether the officer is active.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<Value>,
    /// Whether the officer's details were verified.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<Value>,
    /// Rank, e.g. `"Sub Inspector"`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub rank: Option<Value>,
    /// Role or unit.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub designation: Option<Value>,
    /// Posting station identifier.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub station_id: Option<Value>,
}

/// Caller-supplied plaintext record.
///
/// # Example
///
/// ```
/// use badgevault::record::SensitiveRecord;
///
/// let record = SensitiveRecord::new("MH-CYB-2024-001")
///     .with_name("Priya Sharma")
///     .with_email("priya.sharma@example.gov")
///     .with_rank("Sub Inspector")
///     .with_active(true);
///
/// assert_eq!(record.badge_id(), Some("MH-CYB-2024-001"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveRecord {
    /// Full name.
    #[serde(default, deserialize_with = "canonical_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Phone number.
    #[serde(default, deserialize_with = "canonical_text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Email address.
    #[serde(default, deserialize_with = "canonical_text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Badge identifier; the record's key.
    #[serde(default, deserialize_with = "canonical_text", skip_serializing_if = "Option::is_none")]
    pub badge_id: Option<String>,
    /// Non-sensitive fields.
    #[serde(flatten)]
    pub plain: PlainFields,
}

impl SensitiveRecord {
    /// Creates a record with the given badge identifier.
    #[must_use]
    pub fn new(badge_id: impl Into<String>) -> Self {
        Self { badge_id: Some(badge_id.into()), ..Self::default() }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the rank.
    #[must_use]
    pub fn with_rank(mut self, rank: impl Into<String>) -> Self {
        self.plain.rank = Some(Value::String(rank.into()));
        self
    }

    /// Sets the designation.
    #[must_use]
    pub fn with_designation(mut self, designation: impl Into<String>) -> Self {
        self.plain.designation = Some(Value::String(designation.into()));
        self
    }

    /// Sets the station identifier; any JSON value is kept as given.
    #[must_use]
    pub fn with_station_id(mut self, station_id: impl Into<Value>) -> Self {
        self.plain.station_id = Some(station_id.into());
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.plain.is_active = Some(Value::Bool(active));
        self
    }

    /// Sets the verified flag.
    #[must_use]
    pub fn with_verified(mut self, verified: bool) -> Self {
        self.plain.is_verified = Some(Value::Bool(verified));
        self
    }

    /// Returns the badge identifier, treating an empty string as absent.
    #[must_use]
    pub fn badge_id(&self) -> Option<&str> {
        non_empty(self.badge_id.as_deref())
    }
}

/// Persisted form of a record.
///
/// Each `*_encrypted` field holds a field token, or `""` if the source field
/// was absent. Fields missing from a stored document, or stored as `null`,
/// load as `""`. A stored value of any other non-string type loads as its
/// JSON text, which never decrypts, so only that field reveals as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedRecord {
    /// Token of the name.
    #[serde(default, deserialize_with = "stored_text")]
    pub name_encrypted: String,
    /// Token of the phone number.
    #[serde(default, deserialize_with = "stored_text")]
    pub phone_encrypted: String,
    /// Token of the email address.
    #[serde(default, deserialize_with = "stored_text")]
    pub email_encrypted: String,
    /// Token of the badge identifier.
    #[serde(default, deserialize_with = "stored_text")]
    pub badge_id_encrypted: String,
    /// Search hash of the badge identifier.
    #[serde(default, deserialize_with = "stored_text_opt", skip_serializing_if = "Option::is_none")]
    pub badge_id_hash: Option<String>,
    /// Non-sensitive fields, stored verbatim.
    #[serde(flatten)]
    pub plain: PlainFields,
    /// Record format version, `"1.0"`.
    #[serde(default, deserialize_with = "stored_text")]
    pub encryption_version: String,
    /// Key file modification time captured by the encryptor. Identical for
    /// every record written by the same encryptor.
    #[serde(default, deserialize_with = "stored_text")]
    pub encrypted_at: String,
}

/// Decrypted form of a record.
///
/// A field that was absent is `""`. A field that failed to decrypt holds a
/// [`decryption_error_marker`] instead of its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedRecord {
    /// Full name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Email address.
    pub email: String,
    /// Badge identifier.
    pub badge_id: String,
    /// Non-sensitive fields.
    #[serde(flatten)]
    pub plain: PlainFields,
}

impl RevealedRecord {
    /// Returns `true` if any sensitive field failed to decrypt.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        [&self.name, &self.phone, &self.email, &self.badge_id]
            .into_iter()
            .any(|value| is_decryption_error(value))
    }
}

/// A stored record as returned by the store: decrypted or as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordView {
    /// Decrypted record.
    Revealed(RevealedRecord),
    /// Record exactly as persisted, for inspecting ciphertext.
    Protected(ProtectedRecord),
}

impl RecordView {
    /// Returns the decrypted record, if this is one.
    #[must_use]
    pub const fn as_revealed(&self) -> Option<&RevealedRecord> {
        match self {
            Self::Revealed(record) => Some(record),
            Self::Protected(_) => None,
        }
    }

    /// Returns the stored record, if this is one.
    #[must_use]
    pub const fn as_protected(&self) -> Option<&ProtectedRecord> {
        match self {
            Self::Protected(record) => Some(record),
            Self::Revealed(_) => None,
        }
    }

    /// Converts into the decrypted record, if this is one.
    #[must_use]
    pub fn into_revealed(self) -> Option<RevealedRecord> {
        match self {
            Self::Revealed(record) => Some(record),
            Self::Protected(_) => None,
        }
    }

    /// Converts into the stored record, if this is one.
    #[must_use]
    pub fn into_protected(self) -> Option<ProtectedRecord> {
        match self {
            Self::Protected(record) => Some(record),
            Self::Revealed(_) => None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Keeps an explicit `null` as `Some(Value::Null)`; `default` covers absence.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Accepts any JSON value for a sensitive field and keeps its string form.
/// Falsy values are absent.
fn canonical_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s).filter(|s| !s.is_empty()),
        other if is_truthy(&other) => Some(other.to_string()),
        _ => None,
    })
}

/// `null`, `false`, zero, and empty strings, arrays and objects are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Reads a persisted text field. `null` is empty; other non-strings keep
/// their JSON text.
fn stored_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    stored_text_opt(deserializer).map(Option::unwrap_or_default)
}

fn stored_text_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_allow_list() {
        let record: SensitiveRecord = serde_json::from_value(json!({
            "badge_id": "MH-CYB-2024-001",
            "name": "Priya Sharma",
            "rank": "Sub Inspector",
            "password": "hunter2",
            "notes": {"x": 1}
        }))
        .unwrap();

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(
            back,
            json!({"badge_id": "MH-CYB-2024-001", "name": "Priya Sharma", "rank": "Sub Inspector"})
        );
    }

    #[test]
    fn test_sensitive_scalars_canonicalized() {
        let record: SensitiveRecord = serde_json::from_value(json!({
            "badge_id": 42,
            "phone": 1_234_567_890_u64,
            "email": "",
            "name": null
        }))
        .unwrap();

        assert_eq!(record.badge_id(), Some("42"));
        assert_eq!(record.phone.as_deref(), Some("1234567890"));
        assert_eq!(record.email, None);
        assert_eq!(record.name, None);
    }

    #[test]
    fn test_falsy_sensitive_values_are_absent() {
        let record: SensitiveRecord = serde_json::from_value(json!({
            "badge_id": 0,
            "phone": false,
            "email": [],
            "name": {}
        }))
        .unwrap();

        assert_eq!(record, SensitiveRecord::default());
        assert_eq!(record.badge_id(), None);

        let record: SensitiveRecord =
            serde_json::from_value(json!({"badge_id": 0.0, "name": true})).unwrap();
        assert_eq!(record.badge_id(), None);
        assert_eq!(record.name.as_deref(), Some("true"));
    }

    #[test]
    fn test_plain_fields_keep_types() {
        let record: SensitiveRecord = serde_json::from_value(json!({
            "badge_id": "A",
            "is_active": true,
            "station_id": 17,
            "designation": null
        }))
        .unwrap();

        assert_eq!(record.plain.is_active, Some(json!(true)));
        assert_eq!(record.plain.station_id, Some(json!(17)));
        assert_eq!(record.plain.designation, Some(Value::Null));
        assert_eq!(record.plain.rank, None);
    }

    #[test]
    fn test_empty_badge_id_is_absent() {
        assert_eq!(SensitiveRecord::new("").badge_id(), None);
        assert_eq!(SensitiveRecord::default().badge_id(), None);
    }

    #[test]
    fn test_decryption_error_marker() {
        let marker = decryption_error_marker("authentication failed");
        assert_eq!(marker, "[DECRYPTION_ERROR: authentication failed]");
        assert!(is_decryption_error(&marker));
        assert!(!is_decryption_error("Priya Sharma"));
    }

    #[test]
    fn test_protected_record_tolerates_missing_fields() {
        let record: ProtectedRecord =
            serde_json::from_value(json!({"badge_id_hash": "ab", "rank": "Inspector"})).unwrap();

        assert_eq!(record.name_encrypted, "");
        assert_eq!(record.encryption_version, "");
        assert_eq!(record.plain.rank, Some(json!("Inspector")));
    }

    #[test]
    fn test_protected_record_tolerates_wrong_types() {
        let record: ProtectedRecord = serde_json::from_value(json!({
            "name_encrypted": "token",
            "phone_encrypted": null,
            "email_encrypted": 5,
            "badge_id_encrypted": {"x": 1},
            "badge_id_hash": null,
            "encrypted_at": 1_718_000_000.5
        }))
        .unwrap();

        assert_eq!(record.name_encrypted, "token");
        assert_eq!(record.phone_encrypted, "");
        assert_eq!(record.email_encrypted, "5");
        assert_eq!(record.badge_id_encrypted, r#"{"x":1}"#);
        assert_eq!(record.badge_id_hash, None);
        assert_eq!(record.encrypted_at, "1718000000.5");
    }

    #[test]
    fn test_record_view_accessors() {
        let view = RecordView::Revealed(RevealedRecord {
            name: "Test Officer".to_string(),
            ..RevealedRecord::default()
        });

        assert!(view.as_protected().is_none());
        assert_eq!(view.as_revealed().map(|r| r.name.as_str()), Some("Test Officer"));
        assert!(view.into_protected().is_none());
    }
}
