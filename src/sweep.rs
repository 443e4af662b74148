//! Daily calendar sweep.
//!
//! Once a day, jobs whose generated period started yesterday move from
//! PENDING to PROCESSING, and jobs whose period ended yesterday move from
//! PROCESSING to COMPLETED. The sweep never touches FAILED jobs or jobs
//! without assignments.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{Result, SchedulerError};
use crate::job::{Job, JobStatus};
use crate::store::JobRepository;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub to_processing: usize,
    pub to_completed: usize,
}

#[derive(Clone)]
pub struct PromotionSweep {
    jobs: Arc<dyn JobRepository>,
}

impl PromotionSweep {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    /// Run the sweep as if today were `today`.
    pub async fn run_for(&self, today: NaiveDate) -> Result<SweepReport> {
        let yesterday = today
            .pred_opt()
            .ok_or_else(|| SchedulerError::Validation(format!("no day before {today}")))?;
        info!(%today, %yesterday, "running schedule promotion sweep");

        let to_processing = self
            .promote(JobStatus::Pending, JobStatus::Processing, |job| {
                job.first_assignment_date() == Some(yesterday)
            })
            .await?;
        let to_completed = self
            .promote(JobStatus::Processing, JobStatus::Completed, |job| {
                job.last_assignment_date() == Some(yesterday)
            })
            .await?;

        let report = SweepReport {
            to_processing,
            to_completed,
        };
        info!(to_processing, to_completed, "promotion sweep finished");
        Ok(report)
    }

    async fn promote(
        &self,
        from: JobStatus,
        to: JobStatus,
        due: impl Fn(&Job) -> bool,
    ) -> Result<usize> {
        let mut batch = Vec::new();
        for mut job in self.jobs.find_by_status(from).await? {
            if !due(&job) {
                continue;
            }
            job.transition(to)?;
            batch.push(job);
        }
        if !batch.is_empty() {
            self.jobs.save_all(&batch).await?;
        }
        Ok(batch.len())
    }

    /// Run the sweep every day at `run_at` local time until `shutdown` fires.
    pub fn spawn_daily(
        self,
        run_at: NaiveTime,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Local::now().naive_local();
                let wait = until_next(now, run_at);
                info!(next_in_secs = wait.as_secs(), "promotion sweep scheduled");
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(wait) => {}
                }
                let today = Local::now().date_naive();
                if let Err(e) = self.run_for(today).await {
                    error!(error = %e, "promotion sweep failed");
                }
            }
            info!("promotion sweep stopped");
        })
    }
}

/// Time from `now` until the next occurrence of `run_at`. An exact match
/// counts as the next day's run.
fn until_next(now: NaiveDateTime, run_at: NaiveTime) -> Duration {
    let today = now.date().and_time(run_at);
    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Assignment, ShiftKind};
    use crate::store::InMemoryJobRepository;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A PENDING job with one assignment per day from `begin` to `end`.
    fn generated_job(begin: NaiveDate, end: NaiveDate) -> Job {
        let mut job = Job::new("g", begin);
        let assignments = begin
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|d| Assignment::new("s", d, ShiftKind::Morning))
            .collect();
        job.attach_assignments(assignments).unwrap();
        job
    }

    async fn repo_with(jobs: &[Job]) -> Arc<InMemoryJobRepository> {
        let repo = Arc::new(InMemoryJobRepository::new());
        for job in jobs {
            repo.insert(job.clone()).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn pending_job_starting_yesterday_moves_to_processing() {
        let job = generated_job(date(2026, 10, 19), date(2026, 11, 1));
        let repo = repo_with(std::slice::from_ref(&job)).await;
        let sweep = PromotionSweep::new(repo.clone());

        let report = sweep.run_for(date(2026, 10, 20)).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                to_processing: 1,
                to_completed: 0
            }
        );
        let stored = repo.find(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn processing_job_ending_yesterday_completes() {
        let mut job = generated_job(date(2026, 10, 19), date(2026, 11, 1));
        job.transition(JobStatus::Processing).unwrap();
        let repo = repo_with(std::slice::from_ref(&job)).await;
        let sweep = PromotionSweep::new(repo.clone());

        let report = sweep.run_for(date(2026, 11, 2)).await.unwrap();
        assert_eq!(report.to_completed, 1);
        let stored = repo.find(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn jobs_not_due_are_untouched() {
        let pending = generated_job(date(2026, 10, 19), date(2026, 11, 1));
        let mut processing = generated_job(date(2026, 10, 5), date(2026, 10, 18));
        processing.transition(JobStatus::Processing).unwrap();
        let repo = repo_with(&[pending.clone(), processing.clone()]).await;
        let sweep = PromotionSweep::new(repo.clone());

        // Mid-period for both: neither starts nor ends yesterday.
        let report = sweep.run_for(date(2026, 10, 10)).await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert_eq!(repo.find(&pending.id).await.unwrap().unwrap(), pending);
        assert_eq!(repo.find(&processing.id).await.unwrap().unwrap(), processing);
    }

    #[tokio::test]
    async fn jobs_without_assignments_or_failed_are_ignored() {
        let empty = Job::new("g", date(2026, 10, 19));
        let mut failed = generated_job(date(2026, 10, 19), date(2026, 11, 1));
        failed.fail("boom").unwrap();
        let repo = repo_with(&[empty.clone(), failed.clone()]).await;
        let sweep = PromotionSweep::new(repo.clone());

        let report = sweep.run_for(date(2026, 10, 20)).await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert_eq!(
            repo.find(&empty.id).await.unwrap().unwrap().status,
            JobStatus::Pending
        );
        assert_eq!(
            repo.find(&failed.id).await.unwrap().unwrap().status,
            JobStatus::Failed
        );
    }

    #[tokio::test]
    async fn full_lifecycle_across_two_sweeps() {
        let job = generated_job(date(2026, 10, 19), date(2026, 11, 1));
        let repo = repo_with(std::slice::from_ref(&job)).await;
        let sweep = PromotionSweep::new(repo.clone());

        sweep.run_for(date(2026, 10, 20)).await.unwrap();
        sweep.run_for(date(2026, 11, 2)).await.unwrap();
        let stored = repo.find(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
    }

    #[test]
    fn next_run_later_today() {
        let now = date(2026, 10, 19).and_hms_opt(0, 0, 0).unwrap();
        let wait = until_next(now, NaiveTime::from_hms_opt(0, 5, 0).unwrap());
        assert_eq!(wait, Duration::from_secs(300));
    }

    #[test]
    fn next_run_tomorrow_when_time_has_passed() {
        let now = date(2026, 10, 19).and_hms_opt(0, 5, 0).unwrap();
        let wait = until_next(now, NaiveTime::from_hms_opt(0, 5, 0).unwrap());
        assert_eq!(wait, Duration::from_secs(24 * 3600));
    }
}
