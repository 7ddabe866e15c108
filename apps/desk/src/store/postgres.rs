use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, error, info};

use crate::errors::AppError;
use crate::models::{Applicant, ApplicantSummary, LookupKey};
use crate::store::{validate_patch, ListFilter, Partition, Patch, RecordStore};

/// Postgres-backed store over the `applications` / `applications_archive` tables.
///
/// Rows are read whole as `to_jsonb(row)`. Writes go through
/// `jsonb_populate_record`, so the column set of a patch never has to be known
/// at compile time and every value stays a bound parameter.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    /// Creates the connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn select_sql(partition: Partition, key: &LookupKey) -> String {
    format!(
        "SELECT to_jsonb(t) FROM {table} t WHERE t.{col}::text = $1 LIMIT 1",
        table = partition.table(),
        col = key.field.column(),
    )
}

fn update_sql(partition: Partition, key: &LookupKey, patch: &Patch) -> String {
    let assignments = patch
        .keys()
        .map(|c| format!("{q} = p.{q}", q = quote_ident(c)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {table} AS t SET {assignments} \
         FROM jsonb_populate_record(NULL::{table}, $1) AS p \
         WHERE t.{col}::text = $2",
        table = partition.table(),
        col = key.field.column(),
    )
}

fn insert_sql(partition: Partition) -> String {
    format!(
        "INSERT INTO {table} SELECT * FROM jsonb_populate_record(NULL::{table}, $1)",
        table = partition.table(),
    )
}

fn delete_sql(partition: Partition, key: &LookupKey) -> String {
    format!(
        "DELETE FROM {table} WHERE {col}::text = $1",
        table = partition.table(),
        col = key.field.column(),
    )
}

fn list_sql(partition: Partition, filter: &ListFilter) -> String {
    let predicate = match filter {
        ListFilter::All => "",
        ListFilter::Payment(_) => " WHERE payment::text = $1",
        ListFilter::ExpiredBefore(_) => " WHERE subscription_expiration::date < $1",
        ListFilter::ExpiringBetween(..) => {
            " WHERE subscription_expiration::date BETWEEN $1 AND $2"
        }
    };
    format!(
        r#"
        SELECT alias_email::text AS alias_email,
               first_name::text AS first_name,
               last_name::text AS last_name,
               whatsapp::text AS whatsapp,
               payment::text AS payment,
               subscription_expiration::text AS subscription_expiration
        FROM {table}{predicate}
        ORDER BY subscription_expiration NULLS LAST, alias_email
        "#,
        table = partition.table(),
    )
}

fn write_failed(
    op: &str,
    partition: Partition,
    key: impl std::fmt::Display,
    e: sqlx::Error,
) -> AppError {
    error!("{op} on {} for {key} failed: {e}", partition.table());
    AppError::Persistence(format!("{op} failed: {e}"))
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get(
        &self,
        partition: Partition,
        key: &LookupKey,
    ) -> Result<Option<Applicant>, AppError> {
        let row: Option<Value> = sqlx::query_scalar(&select_sql(partition, key))
            .bind(&key.value)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(Value::Object(map)) => Ok(Some(Applicant::from_map(map))),
            Some(_) => Err(AppError::Internal(anyhow::anyhow!(
                "to_jsonb returned a non-object row"
            ))),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        partition: Partition,
        key: &LookupKey,
        patch: Patch,
    ) -> Result<(), AppError> {
        validate_patch(&patch)?;
        if patch.is_empty() {
            return Ok(());
        }
        let sql = update_sql(partition, key, &patch);
        let columns: Vec<String> = patch.keys().cloned().collect();

        let result = sqlx::query(&sql)
            .bind(Json(Value::Object(patch)))
            .bind(&key.value)
            .execute(&self.pool)
            .await
            .map_err(|e| write_failed("update", partition, key, e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("applicant with {key}")));
        }
        debug!(%key, table = partition.table(), ?columns, "applicant updated");
        Ok(())
    }

    async fn insert(&self, partition: Partition, applicant: &Applicant) -> Result<(), AppError> {
        let label = applicant.display("alias_email");
        sqlx::query(&insert_sql(partition))
            .bind(Json(applicant.as_map()))
            .execute(&self.pool)
            .await
            .map_err(|e| write_failed("insert", partition, &label, e))?;

        debug!(applicant = %label, table = partition.table(), "applicant inserted");
        Ok(())
    }

    async fn delete(&self, partition: Partition, key: &LookupKey) -> Result<(), AppError> {
        sqlx::query(&delete_sql(partition, key))
            .bind(&key.value)
            .execute(&self.pool)
            .await
            .map_err(|e| write_failed("delete", partition, key, e))?;

        debug!(%key, table = partition.table(), "applicant deleted");
        Ok(())
    }

    async fn list(
        &self,
        partition: Partition,
        filter: &ListFilter,
    ) -> Result<Vec<ApplicantSummary>, AppError> {
        let sql = list_sql(partition, filter);
        let query = sqlx::query_as::<_, ApplicantSummary>(&sql);
        let query = match filter {
            ListFilter::All => query,
            ListFilter::Payment(status) => query.bind(status.clone()),
            ListFilter::ExpiredBefore(day) => query.bind(*day),
            ListFilter::ExpiringBetween(from, to) => query.bind(*from).bind(*to),
        };
        Ok(query.fetch_all(&self.pool).await?)
    }
}
