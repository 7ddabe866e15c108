use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{Applicant, ApplicantSummary, LookupKey};
use crate::store::{ListFilter, Partition, Patch, RecordStore};

/// Process-local stand-in for Postgres used by the tests.
#[derive(Default)]
pub struct InMemoryRecordStore {
    rows: Mutex<HashMap<Partition, Vec<Applicant>>>,
    fail_writes: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn with(partition: Partition, row: Value) -> Self {
        let store = Self::default();
        store.seed(partition, row);
        store
    }

    pub fn seed(&self, partition: Partition, row: Value) {
        let Value::Object(map) = row else {
            panic!("seed row must be a JSON object");
        };
        self.rows
            .lock()
            .unwrap()
            .entry(partition)
            .or_default()
            .push(Applicant::from_map(map));
    }

    pub fn snapshot(&self, partition: Partition) -> Vec<Applicant> {
        self.rows
            .lock()
            .unwrap()
            .get(&partition)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every subsequent write fail with `Persistence`.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("write rejected".into()));
        }
        Ok(())
    }
}

fn expiration(a: &Applicant) -> Option<NaiveDate> {
    a.text("subscription_expiration")
        .and_then(|s| NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d").ok())
}

fn keep(filter: &ListFilter, a: &Applicant) -> bool {
    match filter {
        ListFilter::All => true,
        ListFilter::Payment(status) => a.text("payment").as_deref() == Some(status.as_str()),
        ListFilter::ExpiredBefore(day) => expiration(a).is_some_and(|d| d < *day),
        ListFilter::ExpiringBetween(from, to) => {
            expiration(a).is_some_and(|d| *from <= d && d <= *to)
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get(
        &self,
        partition: Partition,
        key: &LookupKey,
    ) -> Result<Option<Applicant>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&partition)
            .and_then(|rows| rows.iter().find(|a| a.matches(key)).cloned()))
    }

    async fn update(
        &self,
        partition: Partition,
        key: &LookupKey,
        patch: Patch,
    ) -> Result<(), AppError> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&partition)
            .and_then(|rows| rows.iter_mut().find(|a| a.matches(key)))
            .ok_or_else(|| AppError::NotFound(format!("applicant with {key}")))?;
        for (column, value) in patch {
            row.set(&column, value);
        }
        Ok(())
    }

    async fn insert(&self, partition: Partition, applicant: &Applicant) -> Result<(), AppError> {
        self.check_writable()?;
        self.rows
            .lock()
            .unwrap()
            .entry(partition)
            .or_default()
            .push(applicant.clone());
        Ok(())
    }

    async fn delete(&self, partition: Partition, key: &LookupKey) -> Result<(), AppError> {
        self.check_writable()?;
        if let Some(rows) = self.rows.lock().unwrap().get_mut(&partition) {
            rows.retain(|a| !a.matches(key));
        }
        Ok(())
    }

    async fn list(
        &self,
        partition: Partition,
        filter: &ListFilter,
    ) -> Result<Vec<ApplicantSummary>, AppError> {
        Ok(self
            .snapshot(partition)
            .iter()
            .filter(|a| keep(filter, a))
            .map(ApplicantSummary::from)
            .collect())
    }
}
