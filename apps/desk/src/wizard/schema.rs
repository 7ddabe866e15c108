//! Field Schema Registry: the fixed, read-only description of every
//! repeating-record type.
//!
//! `fields` order is the prompt order and the persisted key order. Already
//! stored rows depend on these names, so they never change.

use serde::{Deserialize, Serialize};

use crate::models::RecordType;
use crate::wizard::catalog::LANGUAGE_PROFICIENCY_OPTIONS;

/// How a subfield is captured. Anything not listed in a schema's `types` is text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Date,
    Boolean,
    Select,
}

#[derive(Debug)]
pub struct FieldSchema {
    pub record_type: RecordType,
    pub fields: &'static [&'static str],
    labels: &'static [(&'static str, &'static str)],
    types: &'static [(&'static str, FieldKind)],
    optional: &'static [&'static str],
    select_options: &'static [(&'static str, &'static [&'static str])],
}

impl FieldSchema {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Display label; falls back to the title-cased field name.
    pub fn label(&self, field: &str) -> String {
        self.labels
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| title_case(field))
    }

    pub fn kind(&self, field: &str) -> FieldKind {
        self.types
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
            .unwrap_or(FieldKind::Text)
    }

    pub fn is_optional(&self, field: &str) -> bool {
        self.optional.contains(&field)
    }

    /// Fixed option list of a `select` subfield; empty for every other kind.
    pub fn options(&self, field: &str) -> &'static [&'static str] {
        self.select_options
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, options)| *options)
            .unwrap_or(&[])
    }
}

static ROLES: FieldSchema = FieldSchema {
    record_type: RecordType::Roles,
    fields: &[
        "title",
        "company",
        "location",
        "start",
        "end",
        "current",
        "description",
    ],
    labels: &[
        ("title", "Title"),
        ("company", "Company"),
        ("location", "Location"),
        ("start", "Start Date (YYYY-MM)"),
        ("end", "End Date (YYYY-MM)"),
        ("current", "Currently Working"),
        ("description", "Description"),
    ],
    types: &[
        ("current", FieldKind::Boolean),
        ("start", FieldKind::Date),
        ("end", FieldKind::Date),
    ],
    optional: &["end", "start"],
    select_options: &[],
};

static EDUCATION: FieldSchema = FieldSchema {
    record_type: RecordType::Education,
    fields: &["degree", "field", "school", "start", "end"],
    labels: &[
        ("degree", "Degree"),
        ("field", "Field of Study"),
        ("school", "School/University"),
        ("start", "Start Date (YYYY-MM)"),
        ("end", "End Date (YYYY-MM)"),
    ],
    types: &[("start", FieldKind::Date), ("end", FieldKind::Date)],
    optional: &["end", "start"],
    select_options: &[],
};

static CERTIFICATES: FieldSchema = FieldSchema {
    record_type: RecordType::Certificates,
    fields: &["name", "number", "start", "end"],
    labels: &[
        ("name", "Course Name"),
        ("number", "Certificate Number"),
        ("start", "Start Date (YYYY-MM)"),
        ("end", "End Date (YYYY-MM)"),
    ],
    types: &[("start", FieldKind::Date), ("end", FieldKind::Date)],
    optional: &["number", "end", "start"],
    select_options: &[],
};

static LANGUAGES: FieldSchema = FieldSchema {
    record_type: RecordType::Languages,
    fields: &["language", "proficiency"],
    labels: &[("language", "Language"), ("proficiency", "Proficiency Level")],
    types: &[("proficiency", FieldKind::Select)],
    optional: &[],
    select_options: &[("proficiency", LANGUAGE_PROFICIENCY_OPTIONS)],
};

pub fn schema(record_type: RecordType) -> &'static FieldSchema {
    match record_type {
        RecordType::Roles => &ROLES,
        RecordType::Education => &EDUCATION,
        RecordType::Certificates => &CERTIFICATES,
        RecordType::Languages => &LANGUAGES,
    }
}

fn title_case(field: &str) -> String {
    field
        .split('_')
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + c.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
