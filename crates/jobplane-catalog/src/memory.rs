//! In-memory job catalog.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use jobplane_protocols::catalog::{JobCatalog, JobConfiguration, NewJob, SyncStatus};
use jobplane_protocols::error::CatalogError;

#[derive(Default)]
struct State {
    rows: BTreeMap<i64, JobConfiguration>,
    last_id: i64,
}

/// In-memory job catalog.
///
/// Same contract as the SQLite backend, including active-key uniqueness.
/// Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryJobCatalog {
    state: RwLock<State>,
}

impl MemoryJobCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobCatalog for MemoryJobCatalog {
    fn id(&self) -> &str {
        "memory"
    }

    async fn insert(&self, job: NewJob) -> Result<JobConfiguration, CatalogError> {
        let mut state = self.state.write().await;
        let duplicate = state.rows.values().any(|row| {
            !row.is_deleted && row.job_name == job.job_name && row.job_group == job.job_group
        });
        if duplicate {
            return Err(CatalogError::Conflict(job.key().to_string()));
        }

        state.last_id += 1;
        let now = Utc::now();
        let row = JobConfiguration {
            id: state.last_id,
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
        };
        state.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<JobConfiguration>, CatalogError> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn update(&self, job: &JobConfiguration) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        let row = state
            .rows
            .get_mut(&job.id)
            .filter(|row| !row.is_deleted)
            .ok_or_else(|| CatalogError::NotFound(job.id.to_string()))?;

        row.cron_expression = job.cron_expression.clone();
        row.description = job.description.clone();
        row.job_data = job.job_data.clone();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn soft_delete(&self, id: i64) -> Result<bool, CatalogError> {
        let mut state = self.state.write().await;
        match state.rows.get_mut(&id) {
            Some(row) if !row.is_deleted => {
                row.is_deleted = true;
                row.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_active(&self) -> Result<Vec<JobConfiguration>, CatalogError> {
        Ok(self
            .state
            .read()
            .await
            .rows
            .values()
            .filter(|row| !row.is_deleted)
            .cloned()
            .collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<JobConfiguration>, CatalogError> {
        Ok(self
            .state
            .read()
            .await
            .rows
            .values()
            .find(|row| !row.is_deleted && row.job_name == name)
            .cloned())
    }

    async fn set_sync_status(&self, id: i64, status: SyncStatus) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;
        let row = state
            .rows
            .get_mut(&id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        row.sync_status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str) -> NewJob {
        NewJob::new(name, "builtin.noop", "0 * * * * *")
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let catalog = MemoryJobCatalog::new();
        let a = catalog.insert(job("a")).await.unwrap();
        let b = catalog.insert(job("b")).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(catalog.id(), "memory");
    }

    #[tokio::test]
    async fn test_duplicate_active_key_conflicts() {
        let catalog = MemoryJobCatalog::new();
        catalog.insert(job("a")).await.unwrap();
        assert!(matches!(
            catalog.insert(job("a")).await,
            Err(CatalogError::Conflict(_))
        ));
        assert!(catalog.insert(job("a").with_group("other")).await.is_ok());
    }

    #[tokio::test]
    async fn test_soft_delete_frees_key_and_keeps_row() {
        let catalog = MemoryJobCatalog::new();
        let first = catalog.insert(job("a")).await.unwrap();
        assert!(catalog.soft_delete(first.id).await.unwrap());
        assert!(!catalog.soft_delete(first.id).await.unwrap());

        assert!(catalog.insert(job("a")).await.is_ok());
        assert!(catalog.get(first.id).await.unwrap().unwrap().is_deleted);
        assert_eq!(catalog.get_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_find_by_name() {
        let catalog = MemoryJobCatalog::new();
        let mut row = catalog.insert(job("a")).await.unwrap();
        row.cron_expression = "0 0 * * * *".to_string();
        catalog.update(&row).await.unwrap();

        let found = catalog.find_by_name("a").await.unwrap().unwrap();
        assert_eq!(found.cron_expression, "0 0 * * * *");
        assert!(catalog.find_by_name("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let catalog = MemoryJobCatalog::new();
        let row = catalog.insert(job("a")).await.unwrap();
        catalog.soft_delete(row.id).await.unwrap();
        assert!(matches!(
            catalog.update(&row).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_sync_status() {
        let catalog = MemoryJobCatalog::new();
        let row = catalog.insert(job("a")).await.unwrap();
        catalog
            .set_sync_status(row.id, SyncStatus::OutOfSync)
            .await
            .unwrap();
        assert_eq!(
            catalog.get(row.id).await.unwrap().unwrap().sync_status,
            SyncStatus::OutOfSync
        );
        assert!(catalog.set_sync_status(99, SyncStatus::Registered).await.is_err());
    }
}
