//! The generation worker: one attempt to turn a PENDING job into a schedule.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::job::{FailureKind, Job, JobStatus, SkipReason, WorkerOutcome};
use crate::lock::{LockManager, job_lock_key};
use crate::membership::StaffDirectory;
use crate::schedule::AssignmentGenerator;
use crate::store::JobRepository;

/// Runs generation for individual jobs under a per-job distributed lock.
#[derive(Clone)]
pub struct GenerationWorker {
    jobs: Arc<dyn JobRepository>,
    locks: Arc<dyn LockManager>,
    directory: Arc<dyn StaffDirectory>,
    generator: AssignmentGenerator,
    lock_prefix: String,
    lock_ttl: Duration,
}

impl GenerationWorker {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        locks: Arc<dyn LockManager>,
        directory: Arc<dyn StaffDirectory>,
        generator: AssignmentGenerator,
        lock_prefix: impl Into<String>,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            jobs,
            locks,
            directory,
            generator,
            lock_prefix: lock_prefix.into(),
            lock_ttl,
        }
    }

    /// Process one job id. Never fails: every path ends in a [`WorkerOutcome`],
    /// and the lock is released before returning whenever it was acquired.
    pub async fn run(&self, job_id: &str) -> WorkerOutcome {
        let lock_key = job_lock_key(&self.lock_prefix, job_id);
        let token = Uuid::new_v4().to_string();

        if !self.locks.acquire(&lock_key, &token, self.lock_ttl).await {
            warn!(job_id, "job already being processed or lock unavailable, skipping");
            return WorkerOutcome::Skipped(SkipReason::LockContention);
        }

        let outcome = self.process(job_id).await;

        if !self.locks.release(&lock_key, &token).await {
            warn!(job_id, %lock_key, "lock expired before generation finished");
        }
        info!(job_id, ?outcome, "generation attempt finished");
        outcome
    }

    async fn process(&self, job_id: &str) -> WorkerOutcome {
        let mut job = match self.jobs.find(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!(job_id, "job not found, skipping");
                return WorkerOutcome::Skipped(SkipReason::NotFound);
            }
            Err(e) => {
                error!(job_id, error = %e, "failed to load job");
                return WorkerOutcome::Failed(FailureKind::Unexpected(e.to_string()));
            }
        };

        if job.status != JobStatus::Pending {
            warn!(job_id, status = %job.status, "job is not PENDING, skipping");
            return WorkerOutcome::Skipped(SkipReason::NotPending(job.status));
        }
        if !job.assignments().is_empty() {
            warn!(job_id, "job already has a generated schedule, skipping");
            return WorkerOutcome::Skipped(SkipReason::AlreadyGenerated);
        }

        let staff = self.directory.staff_for_group(&job.staff_group_id).await;
        if staff.is_empty() {
            let message = format!(
                "No staff members found for group {} or directory service unavailable.",
                job.staff_group_id
            );
            warn!(job_id, group_id = %job.staff_group_id, "no staff found, failing job");
            return self.fail(&mut job, FailureKind::Business(message)).await;
        }

        info!(
            job_id,
            group_id = %job.staff_group_id,
            week_begin = %job.week_begin_date,
            staff_count = staff.len(),
            "generating schedule"
        );

        // Generation is CPU-bound; keep it off the async executor threads.
        let generator = self.generator;
        let week_begin = job.week_begin_date;
        let generated =
            tokio::task::spawn_blocking(move || generator.generate(&staff, week_begin)).await;

        let assignments = match generated {
            Ok(Ok(assignments)) => assignments,
            Ok(Err(e)) => {
                let message = format!("Internal error during schedule generation: {e}");
                return self.fail(&mut job, FailureKind::Unexpected(message)).await;
            }
            Err(join_error) => {
                let message = format!("Internal error during schedule generation: {join_error}");
                return self.fail(&mut job, FailureKind::Unexpected(message)).await;
            }
        };

        let count = assignments.len();
        if let Err(e) = job.attach_assignments(assignments) {
            return self.fail(&mut job, FailureKind::Unexpected(e.to_string())).await;
        }
        if let Err(e) = self.jobs.save(&job).await {
            error!(job_id, error = %e, "failed to persist generated schedule");
            // Reload so the stored record never carries a partial schedule.
            let Ok(Some(mut stored)) = self.jobs.find(job_id).await else {
                return WorkerOutcome::Failed(FailureKind::Unexpected(e.to_string()));
            };
            return self
                .fail(&mut stored, FailureKind::Unexpected(e.to_string()))
                .await;
        }

        info!(job_id, assignments = count, "schedule generated");
        WorkerOutcome::Generated { assignments: count }
    }

    async fn fail(&self, job: &mut Job, kind: FailureKind) -> WorkerOutcome {
        if let Err(e) = job.fail(kind.message()) {
            error!(job_id = %job.id, error = %e, "could not mark job as FAILED");
        } else if let Err(e) = self.jobs.save(job).await {
            error!(job_id = %job.id, error = %e, "could not persist FAILED job");
        }
        error!(job_id = %job.id, failure = %kind, "schedule generation failed");
        WorkerOutcome::Failed(kind)
    }
}
