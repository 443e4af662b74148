//! Job persistence.
//!
//! [`JobRepository`] is the seam between the scheduler and whatever stores
//! jobs. [`InMemoryJobRepository`] keeps everything in process and backs the
//! binary and the tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, SchedulerError};
use crate::job::{Job, JobStatus};

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Store a new job. Fails if the id is already taken.
    async fn insert(&self, job: Job) -> Result<()>;

    async fn find(&self, id: &str) -> Result<Option<Job>>;

    /// Overwrite an existing job.
    async fn save(&self, job: &Job) -> Result<()>;

    async fn save_all(&self, jobs: &[Job]) -> Result<()> {
        for job in jobs {
            self.save(job).await?;
        }
        Ok(())
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>>;

    /// Jobs in creation order, `size` per page.
    async fn list(&self, page: usize, size: usize) -> Result<Vec<Job>>;
}

#[derive(Default)]
struct Tables {
    jobs: HashMap<String, Job>,
    order: Vec<String>,
}

#[derive(Default)]
pub struct InMemoryJobRepository {
    tables: RwLock<Tables>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn insert(&self, job: Job) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.jobs.contains_key(&job.id) {
            return Err(SchedulerError::Store(format!("duplicate job id {}", job.id)));
        }
        tables.order.push(job.id.clone());
        tables.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Job>> {
        Ok(self.tables.read().await.jobs.get(id).cloned())
    }

    async fn save(&self, job: &Job) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(SchedulerError::JobNotFound(job.id.clone())),
        }
    }

    async fn save_all(&self, jobs: &[Job]) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(missing) = jobs.iter().find(|j| !tables.jobs.contains_key(&j.id)) {
            return Err(SchedulerError::JobNotFound(missing.id.clone()));
        }
        for job in jobs {
            tables.jobs.insert(job.id.clone(), job.clone());
        }
        Ok(())
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .order
            .iter()
            .filter_map(|id| tables.jobs.get(id))
            .filter(|job| job.status == status)
            .cloned()
            .collect())
    }

    async fn list(&self, page: usize, size: usize) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .order
            .iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .filter_map(|id| tables.jobs.get(id))
            .cloned()
            .collect())
    }
}
