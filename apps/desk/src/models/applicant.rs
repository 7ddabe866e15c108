use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::errors::AppError;
use crate::models::nested::{NestedRecord, RecordType};

/// Which natural key an applicant is looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupField {
    AliasEmail,
    Whatsapp,
}

impl LookupField {
    /// Column holding this key in both partitions.
    pub fn column(&self) -> &'static str {
        match self {
            LookupField::AliasEmail => "alias_email",
            LookupField::Whatsapp => "whatsapp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupKey {
    pub field: LookupField,
    pub value: String,
}

impl LookupKey {
    pub fn new(field: LookupField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for LookupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field.column(), self.value)
    }
}

/// A full applicant row as stored, column name to JSON value.
///
/// Columns are not fixed at compile time (the store schema grows independently
/// of this service), so the row stays a JSON object and typed views are taken
/// on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Applicant(Map<String, Value>);

impl Applicant {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Scalar column as text. Absent, null and empty values read as `None`.
    pub fn text(&self, column: &str) -> Option<String> {
        match self.0.get(column)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Scalar column for display, `-` when missing.
    pub fn display(&self, column: &str) -> String {
        self.text(column).unwrap_or_else(|| "-".to_string())
    }

    pub fn matches(&self, key: &LookupKey) -> bool {
        self.text(key.field.column()).as_deref() == Some(key.value.as_str())
    }

    /// Typed view of a repeating-record column. A column that is not a list
    /// reads as an empty list.
    pub fn nested(&self, record_type: RecordType) -> Result<Vec<NestedRecord>, AppError> {
        let Some(Value::Array(items)) = self.0.get(record_type.column()) else {
            return Ok(Vec::new());
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                NestedRecord::from_value(record_type, item).ok_or_else(|| {
                    AppError::MalformedRecord {
                        field: record_type.column().to_string(),
                        index,
                    }
                })
            })
            .collect()
    }

    /// Flat list column as strings. A legacy comma-joined string is split.
    pub fn string_list(&self, column: &str) -> Vec<String> {
        match self.0.get(column) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn set(&mut self, column: &str, value: Value) {
        self.0.insert(column.to_string(), value);
    }
}

/// Narrow projection used by the report listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ApplicantSummary {
    pub alias_email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub whatsapp: Option<String>,
    pub payment: Option<String>,
    pub subscription_expiration: Option<String>,
}

impl From<&Applicant> for ApplicantSummary {
    fn from(a: &Applicant) -> Self {
        Self {
            alias_email: a.text("alias_email"),
            first_name: a.text("first_name"),
            last_name: a.text("last_name"),
            whatsapp: a.text("whatsapp"),
            payment: a.text("payment"),
            subscription_expiration: a.text("subscription_expiration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn applicant(value: Value) -> Applicant {
        match value {
            Value::Object(map) => Applicant::from_map(map),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_text_stringifies_scalars() {
        let a = applicant(json!({"whatsapp": 15551234567u64, "relocate": true, "visa": null, "city": ""}));
        assert_eq!(a.text("whatsapp").as_deref(), Some("15551234567"));
        assert_eq!(a.text("relocate").as_deref(), Some("true"));
        assert_eq!(a.text("visa"), None);
        assert_eq!(a.text("city"), None);
        assert_eq!(a.display("city"), "-");
    }

    #[test]
    fn test_matches_numeric_phone_column() {
        let a = applicant(json!({"whatsapp": 15551234567u64}));
        assert!(a.matches(&LookupKey::new(LookupField::Whatsapp, "15551234567")));
        assert!(!a.matches(&LookupKey::new(LookupField::AliasEmail, "15551234567")));
    }

    #[test]
    fn test_nested_non_list_reads_empty() {
        let a = applicant(json!({"roles": "not a list"}));
        assert!(a.nested(RecordType::Roles).unwrap().is_empty());
    }

    #[test]
    fn test_nested_rejects_non_object_element() {
        let a = applicant(json!({"languages": [{"language": "French", "proficiency": "C1 Advanced"}, 7]}));
        let err = a.nested(RecordType::Languages).unwrap_err();
        assert!(matches!(err, AppError::MalformedRecord { index: 1, .. }));
    }

    #[test]
    fn test_string_list_splits_legacy_string() {
        let a = applicant(json!({"skills": "Rust, SQL ,", "authorized_countries": ["France", null]}));
        assert_eq!(a.string_list("skills"), vec!["Rust", "SQL"]);
        assert_eq!(a.string_list("authorized_countries"), vec!["France"]);
        assert!(a.string_list("country_preference").is_empty());
    }
}
