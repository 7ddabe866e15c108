//! Record Store Adapter: where applicant rows live.
//!
//! The store offers no locking. A read-modify-write of a list column done by two
//! overlapping sessions can drop one side's change; callers narrow the window by
//! reading fresh immediately before every write.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::{Applicant, ApplicantSummary, LookupKey};
use crate::wizard::catalog::is_writable_column;

/// Column name to new value.
pub type Patch = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Active,
    Archived,
}

impl Partition {
    pub fn table(&self) -> &'static str {
        match self {
            Partition::Active => "applications",
            Partition::Archived => "applications_archive",
        }
    }
}

/// Row selection for the report listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Payment(String),
    /// Subscription expiration strictly before the date.
    ExpiredBefore(NaiveDate),
    /// Subscription expiration within the range, both ends inclusive.
    ExpiringBetween(NaiveDate, NaiveDate),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, partition: Partition, key: &LookupKey)
        -> Result<Option<Applicant>, AppError>;

    /// Fails with `NotFound` when no row matches `key`.
    async fn update(&self, partition: Partition, key: &LookupKey, patch: Patch)
        -> Result<(), AppError>;

    async fn insert(&self, partition: Partition, applicant: &Applicant) -> Result<(), AppError>;

    async fn delete(&self, partition: Partition, key: &LookupKey) -> Result<(), AppError>;

    async fn list(
        &self,
        partition: Partition,
        filter: &ListFilter,
    ) -> Result<Vec<ApplicantSummary>, AppError>;
}

/// Like `get`, but absence is an error.
pub async fn fetch(
    store: &dyn RecordStore,
    partition: Partition,
    key: &LookupKey,
) -> Result<Applicant, AppError> {
    store
        .get(partition, key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("applicant with {key}")))
}

/// Moves an applicant between partitions: copy, then delete the source.
pub async fn move_applicant(
    store: &dyn RecordStore,
    key: &LookupKey,
    from: Partition,
    to: Partition,
) -> Result<Applicant, AppError> {
    let applicant = fetch(store, from, key).await?;
    store.insert(to, &applicant).await?;
    store.delete(from, key).await?;
    tracing::info!(%key, from = from.table(), to = to.table(), "applicant moved");
    Ok(applicant)
}

/// Rejects patches touching columns outside the writable set.
pub fn validate_patch(patch: &Patch) -> Result<(), AppError> {
    match patch.keys().find(|column| !is_writable_column(column)) {
        Some(column) => Err(AppError::UnknownField(column.clone())),
        None => Ok(()),
    }
}

/// Single-column patch.
pub fn patch_of(column: &str, value: impl Into<Value>) -> Patch {
    let mut patch = Patch::new();
    patch.insert(column.to_string(), value.into());
    patch
}
