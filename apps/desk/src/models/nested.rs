use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// The repeating-record columns of an applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Roles,
    Education,
    Certificates,
    Languages,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        RecordType::Roles,
        RecordType::Education,
        RecordType::Certificates,
        RecordType::Languages,
    ];

    /// Column name, which is also the record type's wire name.
    pub fn column(&self) -> &'static str {
        match self {
            RecordType::Roles => "roles",
            RecordType::Education => "education",
            RecordType::Certificates => "certificates",
            RecordType::Languages => "languages",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for RecordType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|rt| rt.column() == s)
            .ok_or_else(|| AppError::UnknownRecordType(s.to_string()))
    }
}

// Stored rows predate this service: keys go missing, `current` was written as
// a JSON bool, some values are null. Every subfield reads as a string.
fn lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient")]
    pub company: String,
    #[serde(default, deserialize_with = "lenient")]
    pub location: String,
    #[serde(default, deserialize_with = "lenient")]
    pub start: String,
    #[serde(default, deserialize_with = "lenient")]
    pub end: String,
    #[serde(default, deserialize_with = "lenient")]
    pub current: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub degree: String,
    #[serde(default, deserialize_with = "lenient")]
    pub field: String,
    #[serde(default, deserialize_with = "lenient")]
    pub school: String,
    #[serde(default, deserialize_with = "lenient")]
    pub start: String,
    #[serde(default, deserialize_with = "lenient")]
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub number: String,
    #[serde(default, deserialize_with = "lenient")]
    pub start: String,
    #[serde(default, deserialize_with = "lenient")]
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub language: String,
    #[serde(default, deserialize_with = "lenient")]
    pub proficiency: String,
}

/// One element of a repeating-record column.
///
/// Serializes to the flat object that is persisted; struct field order is the
/// schema's prompt order, so every persisted instance carries every subfield.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NestedRecord {
    Role(RoleEntry),
    Education(EducationEntry),
    Certificate(CertificateEntry),
    Language(LanguageEntry),
}

impl NestedRecord {
    /// Reads a stored element. Only non-objects are rejected.
    pub fn from_value(record_type: RecordType, value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let value = value.clone();
        let record = match record_type {
            RecordType::Roles => NestedRecord::Role(serde_json::from_value(value).ok()?),
            RecordType::Education => NestedRecord::Education(serde_json::from_value(value).ok()?),
            RecordType::Certificates => {
                NestedRecord::Certificate(serde_json::from_value(value).ok()?)
            }
            RecordType::Languages => NestedRecord::Language(serde_json::from_value(value).ok()?),
        };
        Some(record)
    }

    /// Builds a record from collected answers; unanswered subfields are blank.
    pub fn from_fields(record_type: RecordType, fields: &BTreeMap<String, String>) -> Self {
        let take = |name: &str| fields.get(name).cloned().unwrap_or_default();
        match record_type {
            RecordType::Roles => NestedRecord::Role(RoleEntry {
                title: take("title"),
                company: take("company"),
                location: take("location"),
                start: take("start"),
                end: take("end"),
                current: take("current"),
                description: take("description"),
            }),
            RecordType::Education => NestedRecord::Education(EducationEntry {
                degree: take("degree"),
                field: take("field"),
                school: take("school"),
                start: take("start"),
                end: take("end"),
            }),
            RecordType::Certificates => NestedRecord::Certificate(CertificateEntry {
                name: take("name"),
                number: take("number"),
                start: take("start"),
                end: take("end"),
            }),
            RecordType::Languages => NestedRecord::Language(LanguageEntry {
                language: take("language"),
                proficiency: take("proficiency"),
            }),
        }
    }

    pub fn record_type(&self) -> RecordType {
        match self {
            NestedRecord::Role(_) => RecordType::Roles,
            NestedRecord::Education(_) => RecordType::Education,
            NestedRecord::Certificate(_) => RecordType::Certificates,
            NestedRecord::Language(_) => RecordType::Languages,
        }
    }

    /// Subfields in schema order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            NestedRecord::Role(r) => vec![
                ("title", r.title.as_str()),
                ("company", r.company.as_str()),
                ("location", r.location.as_str()),
                ("start", r.start.as_str()),
                ("end", r.end.as_str()),
                ("current", r.current.as_str()),
                ("description", r.description.as_str()),
            ],
            NestedRecord::Education(e) => vec![
                ("degree", e.degree.as_str()),
                ("field", e.field.as_str()),
                ("school", e.school.as_str()),
                ("start", e.start.as_str()),
                ("end", e.end.as_str()),
            ],
            NestedRecord::Certificate(c) => vec![
                ("name", c.name.as_str()),
                ("number", c.number.as_str()),
                ("start", c.start.as_str()),
                ("end", c.end.as_str()),
            ],
            NestedRecord::Language(l) => vec![
                ("language", l.language.as_str()),
                ("proficiency", l.proficiency.as_str()),
            ],
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    pub fn to_fields(&self) -> BTreeMap<String, String> {
        self.fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                .collect(),
        )
    }

    /// One-line summary for confirmations, at most 100 characters.
    pub fn summary(&self) -> String {
        let joined = self
            .fields()
            .into_iter()
            .map(|(_, v)| v)
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" | ");
        if joined.chars().count() > 100 {
            let cut: String = joined.chars().take(100).collect();
            format!("{cut}...")
        } else {
            joined
        }
    }
}
