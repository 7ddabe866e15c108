use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::models::LookupKey;
use crate::store::{fetch, patch_of, Partition, RecordStore};
use crate::wizard::catalog::{canonical_country, ListField};
use crate::wizard::validators::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListOp {
    Add,
    Remove,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub removed: Vec<String>,
    pub not_found: Vec<String>,
    pub remaining: Vec<String>,
}

/// Comma-separated input, trimmed, blanks dropped.
pub fn split_entries(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Splits operator input for an add. Country lists are mapped onto the
/// catalog spelling; anything unknown rejects the whole input.
pub fn parse_entries(field: ListField, text: &str) -> Result<Vec<String>, ValidationError> {
    let entries = split_entries(text);
    if entries.is_empty() {
        return Err(ValidationError::EmptyList);
    }
    if !field.is_country_list() {
        return Ok(entries);
    }
    entries
        .into_iter()
        .map(|e| match canonical_country(&e) {
            Some(country) => Ok(country.to_string()),
            None => Err(ValidationError::UnknownCountry(e)),
        })
        .collect()
}

/// Add / remove / view on the flat string-list columns. Same fresh
/// read-modify-write rule as the nested lists.
#[derive(Clone)]
pub struct FlatLists {
    store: Arc<dyn RecordStore>,
}

impl FlatLists {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn view(&self, key: &LookupKey, field: ListField) -> Result<Vec<String>, AppError> {
        Ok(fetch(self.store.as_ref(), Partition::Active, key)
            .await?
            .string_list(field.column()))
    }

    /// Appends entries not already present (case-insensitive).
    pub async fn add(
        &self,
        key: &LookupKey,
        field: ListField,
        entries: Vec<String>,
    ) -> Result<AddOutcome, AppError> {
        let mut list = self.view(key, field).await?;
        let mut added = Vec::new();
        let mut skipped = Vec::new();
        for entry in entries {
            if list.iter().any(|e| e.eq_ignore_ascii_case(&entry)) {
                skipped.push(entry);
            } else {
                list.push(entry.clone());
                added.push(entry);
            }
        }
        if !added.is_empty() {
            self.persist(key, field, &list).await?;
            info!(%key, field = field.column(), added = added.len(), "list entries added");
        }
        Ok(AddOutcome {
            added,
            skipped,
            total: list.len(),
        })
    }

    /// Removes matching entries (case-insensitive). Nothing is written when
    /// no entry matched.
    pub async fn remove(
        &self,
        key: &LookupKey,
        field: ListField,
        entries: Vec<String>,
    ) -> Result<RemoveOutcome, AppError> {
        let mut list = self.view(key, field).await?;
        let mut removed = Vec::new();
        let mut not_found = Vec::new();
        for entry in entries {
            match list.iter().position(|e| e.eq_ignore_ascii_case(&entry)) {
                Some(i) => removed.push(list.remove(i)),
                None => not_found.push(entry),
            }
        }
        if !removed.is_empty() {
            self.persist(key, field, &list).await?;
            info!(%key, field = field.column(), removed = removed.len(), "list entries removed");
        }
        Ok(RemoveOutcome {
            removed,
            not_found,
            remaining: list,
        })
    }

    async fn persist(&self, key: &LookupKey, field: ListField, list: &[String]) -> Result<(), AppError> {
        let value = Value::Array(list.iter().cloned().map(Value::String).collect());
        self.store
            .update(Partition::Active, key, patch_of(field.column(), value))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LookupField;
    use crate::store::memory::InMemoryRecordStore;
    use serde_json::json;

    fn key() -> LookupKey {
        LookupKey::new(LookupField::Whatsapp, "15551234567")
    }

    fn lists(row: Value) -> (Arc<InMemoryRecordStore>, FlatLists) {
        let store = Arc::new(InMemoryRecordStore::with(Partition::Active, row));
        (store.clone(), FlatLists::new(store))
    }

    #[test]
    fn test_parse_skills_trims_and_drops_blanks() {
        assert_eq!(
            parse_entries(ListField::Skills, " Rust ,SQL,, Kafka ").unwrap(),
            vec!["Rust", "SQL", "Kafka"]
        );
        assert_eq!(
            parse_entries(ListField::Skills, " , "),
            Err(ValidationError::EmptyList)
        );
    }

    #[test]
    fn test_parse_countries_canonicalises() {
        assert_eq!(
            parse_entries(ListField::CountryPreference, "germany, united states").unwrap(),
            vec!["Germany", "United States"]
        );
        assert_eq!(
            parse_entries(ListField::AuthorizedCountries, "France, Narnia"),
            Err(ValidationError::UnknownCountry("Narnia".into()))
        );
    }

    #[tokio::test]
    async fn test_add_skips_duplicates() {
        let (store, lists) = lists(json!({"whatsapp": "15551234567", "skills": ["Rust"]}));
        let outcome = lists
            .add(&key(), ListField::Skills, vec!["rust".into(), "Go".into()])
            .await
            .unwrap();
        assert_eq!(outcome.added, vec!["Go"]);
        assert_eq!(outcome.skipped, vec!["rust"]);
        assert_eq!(outcome.total, 2);
        let stored = store.get(Partition::Active, &key()).await.unwrap().unwrap();
        assert_eq!(stored.string_list("skills"), vec!["Rust", "Go"]);
    }

    #[tokio::test]
    async fn test_add_over_legacy_string_writes_array() {
        let (store, lists) = lists(json!({"whatsapp": "15551234567", "skills": "Rust, SQL"}));
        lists
            .add(&key(), ListField::Skills, vec!["Go".into()])
            .await
            .unwrap();
        let stored = store.get(Partition::Active, &key()).await.unwrap().unwrap();
        assert_eq!(stored.as_map()["skills"], json!(["Rust", "SQL", "Go"]));
    }

    #[tokio::test]
    async fn test_remove_reports_matches() {
        let (_, lists) = lists(json!({
            "whatsapp": "15551234567",
            "authorized_countries": ["France", "Spain"]
        }));
        let outcome = lists
            .remove(
                &key(),
                ListField::AuthorizedCountries,
                vec!["spain".into(), "Chad".into()],
            )
            .await
            .unwrap();
        assert_eq!(outcome.removed, vec!["Spain"]);
        assert_eq!(outcome.not_found, vec!["Chad"]);
        assert_eq!(outcome.remaining, vec!["France"]);
    }

    #[tokio::test]
    async fn test_remove_nothing_matched_does_not_write() {
        let (store, lists) = lists(json!({"whatsapp": "15551234567", "skills": "Rust"}));
        store.fail_writes();
        let outcome = lists
            .remove(&key(), ListField::Skills, vec!["Go".into()])
            .await
            .unwrap();
        assert!(outcome.removed.is_empty());
        assert_eq!(outcome.remaining, vec!["Rust"]);
    }
}
