//! Job catalog protocol definitions.
//!
//! The catalog is the durable source of truth for job configurations across
//! process restarts. Rows are never physically removed; deletion flips
//! `is_deleted`.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::job::{JobKey, DEFAULT_GROUP};

/// Whether a persisted row is known to match the live engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncStatus {
    Registered,
    #[default]
    Unregistered,
    OutOfSync,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Registered => "Registered",
            SyncStatus::Unregistered => "Unregistered",
            SyncStatus::OutOfSync => "OutOfSync",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Registered" => Ok(SyncStatus::Registered),
            "Unregistered" => Ok(SyncStatus::Unregistered),
            "OutOfSync" => Ok(SyncStatus::OutOfSync),
            other => Err(CatalogError::QueryError(format!("unknown sync status '{}'", other))),
        }
    }
}

/// Persisted job configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfiguration {
    pub id: i64,
    pub job_name: String,
    pub job_group: String,
    pub job_type: String,
    pub cron_expression: String,
    pub description: String,
    pub job_data: String,
    pub is_deleted: bool,
    pub sync_status: SyncStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobConfiguration {
    pub fn key(&self) -> JobKey {
        JobKey::new(self.job_name.clone(), self.job_group.clone())
    }
}

/// Fields for a new catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub job_name: String,
    #[serde(default = "default_group")]
    pub job_group: String,
    pub job_type: String,
    pub cron_expression: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub job_data: String,
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

impl NewJob {
    pub fn new(
        job_name: impl Into<String>,
        job_type: impl Into<String>,
        cron_expression: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            job_group: default_group(),
            job_type: job_type.into(),
            cron_expression: cron_expression.into(),
            description: String::new(),
            job_data: String::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.job_group = group.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_data(mut self, job_data: impl Into<String>) -> Self {
        self.job_data = job_data.into();
        self
    }

    pub fn key(&self) -> JobKey {
        JobKey::new(self.job_name.clone(), self.job_group.clone())
    }
}

/// Mutable fields of a job; name, group, and type are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub cron_expression: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub job_data: String,
}

/// Durable store for job configurations.
#[async_trait]
pub trait JobCatalog: Send + Sync {
    /// Returns the backend ID.
    fn id(&self) -> &str;

    /// Insert a new row. Fails with `Conflict` if an active row has the same key.
    async fn insert(&self, job: NewJob) -> Result<JobConfiguration, CatalogError>;

    /// Load a row by id, including soft-deleted rows.
    async fn get(&self, id: i64) -> Result<Option<JobConfiguration>, CatalogError>;

    /// Overwrite the mutable fields of an existing row.
    async fn update(&self, job: &JobConfiguration) -> Result<(), CatalogError>;

    /// Mark a row deleted. Returns false if no active row had that id.
    async fn soft_delete(&self, id: i64) -> Result<bool, CatalogError>;

    /// All rows that are not deleted, ordered by id.
    async fn get_active(&self) -> Result<Vec<JobConfiguration>, CatalogError>;

    /// First active row with this job name, in any group.
    async fn find_by_name(&self, name: &str) -> Result<Option<JobConfiguration>, CatalogError>;

    /// Record the reconciliation status of a row.
    async fn set_sync_status(&self, id: i64, status: SyncStatus) -> Result<(), CatalogError>;
}
