//! Array Field Controller: add / edit / delete / view on any repeating-record column.
//!
//! Every mutation re-reads the list from the store right before writing it
//! back. This narrows the lost-update window without closing it: the store
//! has no compare-and-set.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::models::{LookupKey, NestedRecord, RecordType};
use crate::store::{fetch, patch_of, Partition, RecordStore};
use crate::wizard::engine::{WizardOp, WizardState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayOp {
    Add,
    Edit,
    Delete,
    View,
}

#[derive(Clone)]
pub struct ArrayFields {
    store: Arc<dyn RecordStore>,
}

impl ArrayFields {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    async fn read(&self, key: &LookupKey, rt: RecordType) -> Result<Vec<NestedRecord>, AppError> {
        fetch(self.store.as_ref(), Partition::Active, key)
            .await?
            .nested(rt)
    }

    /// Stored elements exactly as they are, alongside their typed view.
    /// Writes go through the raw list so untouched entries keep unknown keys
    /// and non-string values.
    async fn read_raw(
        &self,
        key: &LookupKey,
        rt: RecordType,
    ) -> Result<(Vec<Value>, Vec<NestedRecord>), AppError> {
        let applicant = fetch(self.store.as_ref(), Partition::Active, key).await?;
        let typed = applicant.nested(rt)?;
        let raw = match applicant.as_map().get(rt.column()) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        Ok((raw, typed))
    }

    /// Current entries. Never writes.
    pub async fn view(&self, key: &LookupKey, rt: RecordType) -> Result<Vec<NestedRecord>, AppError> {
        self.read(key, rt).await
    }

    pub fn begin_add(&self, rt: RecordType) -> WizardState {
        WizardState::for_add(rt)
    }

    /// Starts an edit wizard seeded from the stored entry at `index`.
    pub async fn begin_edit(
        &self,
        key: &LookupKey,
        rt: RecordType,
        index: usize,
    ) -> Result<WizardState, AppError> {
        let list = self.read(key, rt).await?;
        let existing = list.get(index).ok_or(AppError::IndexOutOfRange {
            index,
            len: list.len(),
        })?;
        Ok(WizardState::for_edit(index, existing))
    }

    /// Writes a finished wizard's record: appended for add, replaced in place
    /// for edit. Returns the list as persisted.
    pub async fn commit(
        &self,
        key: &LookupKey,
        wizard: &WizardState,
        record: NestedRecord,
    ) -> Result<Vec<NestedRecord>, AppError> {
        let rt = wizard.record_type;
        if record.record_type() != rt {
            return Err(AppError::InvalidState(format!(
                "{} record committed to the {rt} wizard",
                record.record_type()
            )));
        }

        let (mut raw, mut list) = self.read_raw(key, rt).await?;
        match wizard.operation {
            WizardOp::Add => {
                raw.push(record.to_value());
                list.push(record);
            }
            WizardOp::Edit => {
                let index = wizard.target_index.ok_or_else(|| {
                    AppError::InvalidState("edit wizard without a target entry".into())
                })?;
                let len = list.len();
                if index >= len {
                    return Err(AppError::IndexOutOfRange { index, len });
                }
                raw[index] = record.to_value();
                list[index] = record;
            }
        }
        self.persist(key, rt, raw).await?;
        info!(%key, field = %rt, op = ?wizard.operation, len = list.len(), "nested entry saved");
        Ok(list)
    }

    /// Removes the entry at `index`, keeping the order of the rest.
    /// Returns the removed entry.
    pub async fn delete(
        &self,
        key: &LookupKey,
        rt: RecordType,
        index: usize,
    ) -> Result<NestedRecord, AppError> {
        let (mut raw, mut list) = self.read_raw(key, rt).await?;
        if index >= list.len() {
            return Err(AppError::IndexOutOfRange {
                index,
                len: list.len(),
            });
        }
        raw.remove(index);
        let removed = list.remove(index);
        self.persist(key, rt, raw).await?;
        info!(%key, field = %rt, index, "nested entry deleted");
        Ok(removed)
    }

    async fn persist(
        &self,
        key: &LookupKey,
        rt: RecordType,
        list: Vec<Value>,
    ) -> Result<(), AppError> {
        self.store
            .update(Partition::Active, key, patch_of(rt.column(), Value::Array(list)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Applicant, ApplicantSummary, LookupField};
    use crate::store::memory::InMemoryRecordStore;
    use crate::store::{ListFilter, Patch};
    use crate::wizard::engine::Advance;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tokio::sync::Barrier;

    fn key() -> LookupKey {
        LookupKey::new(LookupField::AliasEmail, "ada@desk.test")
    }

    fn seeded(languages: Value) -> Arc<InMemoryRecordStore> {
        Arc::new(InMemoryRecordStore::with(
            Partition::Active,
            json!({"alias_email": "ada@desk.test", "languages": languages}),
        ))
    }

    fn lang(language: &str) -> Value {
        json!({"language": language, "proficiency": "B1 Intermediate"})
    }

    async fn stored_languages(store: &InMemoryRecordStore) -> Vec<String> {
        store
            .get(Partition::Active, &key())
            .await
            .unwrap()
            .unwrap()
            .nested(RecordType::Languages)
            .unwrap()
            .iter()
            .map(|r| r.get("language").unwrap_or_default().to_string())
            .collect()
    }

    fn finish(wizard: &mut WizardState, inputs: &[&str]) -> NestedRecord {
        for input in inputs {
            if let Advance::Finished(record) = wizard.advance(input).unwrap() {
                return record;
            }
        }
        panic!("wizard did not finish");
    }

    #[tokio::test]
    async fn test_add_appends_full_record() {
        let store = seeded(json!([lang("French")]));
        let arrays = ArrayFields::new(store.clone());

        let mut wizard = arrays.begin_add(RecordType::Languages);
        let record = finish(&mut wizard, &["German", "C1 Advanced"]);
        let list = arrays.commit(&key(), &wizard, record).await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(stored_languages(&store).await, vec!["French", "German"]);
    }

    #[tokio::test]
    async fn test_add_to_missing_column_starts_list() {
        let store = Arc::new(InMemoryRecordStore::with(
            Partition::Active,
            json!({"alias_email": "ada@desk.test", "languages": null}),
        ));
        let arrays = ArrayFields::new(store.clone());
        let mut wizard = arrays.begin_add(RecordType::Languages);
        let record = finish(&mut wizard, &["Arabic", "C2 Mastery"]);
        arrays.commit(&key(), &wizard, record).await.unwrap();
        assert_eq!(stored_languages(&store).await, vec!["Arabic"]);
    }

    #[tokio::test]
    async fn test_edit_replaces_in_place() {
        let store = seeded(json!([lang("French"), lang("Spanish"), lang("Italian")]));
        let arrays = ArrayFields::new(store.clone());

        let mut wizard = arrays.begin_edit(&key(), RecordType::Languages, 1).await.unwrap();
        assert_eq!(wizard.original["language"], "Spanish");
        let record = finish(&mut wizard, &["Portuguese", "A2 Elementary"]);
        arrays.commit(&key(), &wizard, record).await.unwrap();

        assert_eq!(
            stored_languages(&store).await,
            vec!["French", "Portuguese", "Italian"]
        );
    }

    fn seeded_role() -> Value {
        json!({
            "title": "CTO",
            "company": "Acme",
            "location": "",
            "start": "2020-01",
            "end": "",
            "current": true,
            "description": "d",
            "team_size": "5"
        })
    }

    fn stored_column(store: &InMemoryRecordStore, column: &str) -> Vec<Value> {
        let rows = store.snapshot(Partition::Active);
        rows[0].as_map()[column].as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_add_leaves_existing_entries_untouched() {
        let store = Arc::new(InMemoryRecordStore::with(
            Partition::Active,
            json!({"alias_email": "ada@desk.test", "roles": [seeded_role()]}),
        ));
        let arrays = ArrayFields::new(store.clone());

        let wizard = arrays.begin_add(RecordType::Roles);
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Engineer".to_string());
        let record = NestedRecord::from_fields(RecordType::Roles, &fields);
        arrays.commit(&key(), &wizard, record).await.unwrap();

        let roles = stored_column(&store, "roles");
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0], seeded_role());
        assert_eq!(roles[1]["title"], "Engineer");
    }

    #[tokio::test]
    async fn test_edit_and_delete_leave_other_entries_untouched() {
        let store = Arc::new(InMemoryRecordStore::with(
            Partition::Active,
            json!({"alias_email": "ada@desk.test", "languages": [
                {"language": "French", "proficiency": "C1 Advanced", "certified": true},
                lang("Spanish"),
                lang("Italian"),
            ]}),
        ));
        let arrays = ArrayFields::new(store.clone());

        let mut wizard = arrays.begin_edit(&key(), RecordType::Languages, 1).await.unwrap();
        let record = finish(&mut wizard, &["Portuguese", "A2 Elementary"]);
        arrays.commit(&key(), &wizard, record).await.unwrap();
        arrays.delete(&key(), RecordType::Languages, 2).await.unwrap();

        let languages = stored_column(&store, "languages");
        assert_eq!(languages.len(), 2);
        assert_eq!(languages[0]["certified"], true);
        assert_eq!(languages[1]["language"], "Portuguese");
    }

    #[tokio::test]
    async fn test_begin_edit_out_of_range() {
        let arrays = ArrayFields::new(seeded(json!([lang("French")])));
        let err = arrays
            .begin_edit(&key(), RecordType::Languages, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfRange { index: 1, len: 1 }));
    }

    #[tokio::test]
    async fn test_delete_preserves_order() {
        let store = seeded(json!([lang("French"), lang("Spanish"), lang("Italian")]));
        let arrays = ArrayFields::new(store.clone());

        let removed = arrays.delete(&key(), RecordType::Languages, 1).await.unwrap();
        assert_eq!(removed.get("language"), Some("Spanish"));
        assert_eq!(stored_languages(&store).await, vec!["French", "Italian"]);
    }

    #[tokio::test]
    async fn test_delete_out_of_range_leaves_list_unchanged() {
        let store = seeded(json!([lang("French"), lang("Spanish")]));
        let arrays = ArrayFields::new(store.clone());

        let err = arrays.delete(&key(), RecordType::Languages, 2).await.unwrap_err();
        assert!(matches!(err, AppError::IndexOutOfRange { index: 2, len: 2 }));
        assert_eq!(stored_languages(&store).await, vec!["French", "Spanish"]);
    }

    #[tokio::test]
    async fn test_view_is_idempotent() {
        let store = seeded(json!([lang("French"), {"language": "Dutch"}]));
        let arrays = ArrayFields::new(store.clone());
        let before = store.snapshot(Partition::Active);

        let first = arrays.view(&key(), RecordType::Languages).await.unwrap();
        let second = arrays.view(&key(), RecordType::Languages).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[1].get("proficiency"), Some(""));
        assert_eq!(store.snapshot(Partition::Active), before);
    }

    #[tokio::test]
    async fn test_commit_for_missing_applicant_is_not_found() {
        let arrays = ArrayFields::new(Arc::new(InMemoryRecordStore::default()));
        let mut wizard = arrays.begin_add(RecordType::Languages);
        let record = finish(&mut wizard, &["German", "C1 Advanced"]);
        let err = arrays.commit(&key(), &wizard, record).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_write_failure_is_persistence_error() {
        let store = seeded(json!([]));
        store.fail_writes();
        let arrays = ArrayFields::new(store.clone());
        let mut wizard = arrays.begin_add(RecordType::Languages);
        let record = finish(&mut wizard, &["German", "C1 Advanced"]);
        let err = arrays.commit(&key(), &wizard, record).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert!(stored_languages(&store).await.is_empty());
    }

    /// Holds every read until two readers have arrived, so both commits see
    /// the same list before either writes.
    struct LockstepStore {
        inner: Arc<InMemoryRecordStore>,
        barrier: Barrier,
    }

    #[async_trait]
    impl RecordStore for LockstepStore {
        async fn get(
            &self,
            partition: Partition,
            key: &LookupKey,
        ) -> Result<Option<Applicant>, AppError> {
            let row = self.inner.get(partition, key).await;
            self.barrier.wait().await;
            row
        }

        async fn update(
            &self,
            partition: Partition,
            key: &LookupKey,
            patch: Patch,
        ) -> Result<(), AppError> {
            self.inner.update(partition, key, patch).await
        }

        async fn insert(&self, partition: Partition, applicant: &Applicant) -> Result<(), AppError> {
            self.inner.insert(partition, applicant).await
        }

        async fn delete(&self, partition: Partition, key: &LookupKey) -> Result<(), AppError> {
            self.inner.delete(partition, key).await
        }

        async fn list(
            &self,
            partition: Partition,
            filter: &ListFilter,
        ) -> Result<Vec<ApplicantSummary>, AppError> {
            self.inner.list(partition, filter).await
        }
    }

    #[tokio::test]
    async fn test_overlapping_adds_lose_an_update() {
        let inner = seeded(json!([]));
        let arrays = ArrayFields::new(Arc::new(LockstepStore {
            inner: inner.clone(),
            barrier: Barrier::new(2),
        }));

        let mut first = WizardState::for_add(RecordType::Languages);
        let first_record = finish(&mut first, &["German", "C1 Advanced"]);
        let mut second = WizardState::for_add(RecordType::Languages);
        let second_record = finish(&mut second, &["Korean", "A1 Beginner"]);

        let k = key();
        let (a, b) = tokio::join!(
            arrays.commit(&k, &first, first_record),
            arrays.commit(&k, &second, second_record),
        );
        a.unwrap();
        b.unwrap();

        // Both commits succeeded, but the store holds only one of the two entries.
        let stored = stored_languages(&inner).await;
        assert_eq!(stored.len(), 1);
        assert!(stored == ["German"] || stored == ["Korean"]);
    }
}
