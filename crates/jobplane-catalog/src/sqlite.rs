//! SQLite job catalog.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;
use tracing::debug;

use jobplane_protocols::catalog::{JobCatalog, JobConfiguration, NewJob, SyncStatus};
use jobplane_protocols::error::CatalogError;

use crate::schema::init_schema;

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;

const SELECT_COLUMNS: &str = "SELECT id, job_name, job_group, job_type, cron_expression,
    description, job_data, is_deleted, sync_status, created_at, updated_at
    FROM job_configurations";

/// SQLite-backed job catalog.
pub struct SqliteJobCatalog {
    conn: Connection,
}

impl SqliteJobCatalog {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| CatalogError::ConnectionError(e.to_string()))?;
        Self::init(conn).await
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| CatalogError::ConnectionError(e.to_string()))?;
            }
        }

        debug!("Opening job catalog at {}", path.display());
        let conn = Connection::open(path)
            .await
            .map_err(|e| CatalogError::ConnectionError(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, CatalogError> {
        conn.call(|conn| Ok(init_schema(conn)?))
            .await
            .map_err(|e| CatalogError::StorageError(e.to_string()))?;
        Ok(Self { conn })
    }
}

/// Raw column values; converted outside the connection thread.
struct JobRow {
    id: i64,
    job_name: String,
    job_group: String,
    job_type: String,
    cron_expression: String,
    description: String,
    job_data: String,
    is_deleted: bool,
    sync_status: String,
    created_at: String,
    updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            job_name: row.get(1)?,
            job_group: row.get(2)?,
            job_type: row.get(3)?,
            cron_expression: row.get(4)?,
            description: row.get(5)?,
            job_data: row.get(6)?,
            is_deleted: row.get(7)?,
            sync_status: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_configuration(self) -> Result<JobConfiguration, CatalogError> {
        Ok(JobConfiguration {
            id: self.id,
            job_name: self.job_name,
            job_group: self.job_group,
            job_type: self.job_type,
            cron_expression: self.cron_expression,
            description: self.description,
            job_data: self.job_data,
            is_deleted: self.is_deleted,
            sync_status: self.sync_status.parse()?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, CatalogError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CatalogError::QueryError(format!("invalid timestamp '{}': {}", value, e)))
}

/// Map a connection error, surfacing unique index violations as `Conflict`.
fn map_error(e: tokio_rusqlite::Error) -> CatalogError {
    match e {
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(err, message))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            CatalogError::Conflict(message.unwrap_or_else(|| err.to_string()))
        }
        tokio_rusqlite::Error::ConnectionClosed => {
            CatalogError::ConnectionError("connection closed".to_string())
        }
        other => CatalogError::QueryError(other.to_string()),
    }
}

#[async_trait]
impl JobCatalog for SqliteJobCatalog {
    fn id(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, job: NewJob) -> Result<JobConfiguration, CatalogError> {
        let now = Utc::now();
        let stamp = now.to_rfc3339();
        let row = job.clone();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO job_configurations
                     (job_name, job_group, job_type, cron_expression, description, job_data,
                      is_deleted, sync_status, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?8)",
                    params![
                        row.job_name,
                        row.job_group,
                        row.job_type,
                        row.cron_expression,
                        row.description,
                        row.job_data,
                        SyncStatus::Unregistered.as_str(),
                        stamp,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|e| match map_error(e) {
                CatalogError::Conflict(_) => CatalogError::Conflict(job.key().to_string()),
                other => other,
            })?;

        Ok(JobConfiguration {
            id,
            job_name: job.job_name,
            job_group: job.job_group,
            job_type: job.job_type,
            cron_expression: job.cron_expression,
            description: job.description,
            job_data: job.job_data,
            is_deleted: false,
            sync_status: SyncStatus::Unregistered,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<JobConfiguration>, CatalogError> {
        let row = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                        [id],
                        JobRow::from_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(map_error)?;

        row.map(JobRow::into_configuration).transpose()
    }

    async fn update(&self, job: &JobConfiguration) -> Result<(), CatalogError> {
        let id = job.id;
        let cron_expression = job.cron_expression.clone();
        let description = job.description.clone();
        let job_data = job.job_data.clone();
        let now = Utc::now().to_rfc3339();

        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE job_configurations
                     SET cron_expression = ?1, description = ?2, job_data = ?3, updated_at = ?4
                     WHERE id = ?5 AND is_deleted = 0",
                    params![cron_expression, description, job_data, now, id],
                )?;
                Ok(changed)
            })
            .await
            .map_err(map_error)?;

        if changed == 0 {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, CatalogError> {
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE job_configurations SET is_deleted = 1, updated_at = ?1
                     WHERE id = ?2 AND is_deleted = 0",
                    params![now, id],
                )?;
                Ok(changed)
            })
            .await
            .map_err(map_error)?;
        Ok(changed > 0)
    }

    async fn get_active(&self) -> Result<Vec<JobConfiguration>, CatalogError> {
        let rows = self
            .conn
            .call(|conn| {
                let mut stmt =
                    conn.prepare(&format!("{} WHERE is_deleted = 0 ORDER BY id", SELECT_COLUMNS))?;
                let rows = stmt
                    .query_map([], JobRow::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_error)?;

        rows.into_iter().map(JobRow::into_configuration).collect()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<JobConfiguration>, CatalogError> {
        let name = name.to_string();
        let row = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        &format!(
                            "{} WHERE job_name = ?1 AND is_deleted = 0 ORDER BY id LIMIT 1",
                            SELECT_COLUMNS
                        ),
                        [&name],
                        JobRow::from_row,
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(map_error)?;

        row.map(JobRow::into_configuration).transpose()
    }

    async fn set_sync_status(&self, id: i64, status: SyncStatus) -> Result<(), CatalogError> {
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE job_configurations SET sync_status = ?1 WHERE id = ?2",
                    params![status.as_str(), id],
                )?;
                Ok(changed)
            })
            .await
            .map_err(map_error)?;

        if changed == 0 {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
