//! Submission, status and result operations behind the HTTP API.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SchedulerError};
use crate::job::{Job, JobStatus};
use crate::pool::WorkerPool;
use crate::schedule::Assignment;
use crate::store::JobRepository;
use crate::sweep::{PromotionSweep, SweepReport};

const MAX_GROUP_ID_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    #[serde(default)]
    pub staff_group_id: String,
    #[serde(default)]
    pub week_begin_date: Option<NaiveDate>,
}

impl CreateScheduleRequest {
    /// Reject blank or oversized group ids and week starts that are missing,
    /// in the past relative to `today`, or not a Monday.
    pub fn validate(&self, today: NaiveDate) -> Result<NaiveDate> {
        if self.staff_group_id.trim().is_empty() {
            return Err(SchedulerError::Validation(
                "staffGroupId must not be blank".to_string(),
            ));
        }
        if self.staff_group_id.chars().count() > MAX_GROUP_ID_LEN {
            return Err(SchedulerError::Validation(format!(
                "staffGroupId must be at most {MAX_GROUP_ID_LEN} characters"
            )));
        }
        let Some(week_begin) = self.week_begin_date else {
            return Err(SchedulerError::Validation(
                "weekBeginDate is required".to_string(),
            ));
        };
        if week_begin < today {
            return Err(SchedulerError::Validation(format!(
                "weekBeginDate {week_begin} is in the past"
            )));
        }
        if week_begin.weekday() != Weekday::Mon {
            return Err(SchedulerError::Validation(format!(
                "weekBeginDate {week_begin} is a {}, expected a Monday",
                week_begin.weekday()
            )));
        }
        Ok(week_begin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub schedule_id: String,
    pub status: JobStatus,
    pub error_message: Option<String>,
}

impl From<&Job> for ScheduleResponse {
    fn from(job: &Job) -> Self {
        Self {
            schedule_id: job.id.clone(),
            status: job.status,
            error_message: job.error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub schedule_id: String,
    pub week_begin_date: NaiveDate,
    pub staff_group_id: String,
    pub assignments: Vec<Assignment>,
}

/// One row of the paged job listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSummary {
    pub schedule_id: String,
    pub staff_group_id: String,
    pub week_begin_date: NaiveDate,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Job> for ScheduleSummary {
    fn from(job: Job) -> Self {
        Self {
            schedule_id: job.id,
            staff_group_id: job.staff_group_id,
            week_begin_date: job.week_begin_date,
            status: job.status,
            error_message: job.error_message,
            created_at: job.created_at,
        }
    }
}

pub struct ScheduleService {
    jobs: Arc<dyn JobRepository>,
    pool: Arc<WorkerPool>,
}

impl ScheduleService {
    pub fn new(jobs: Arc<dyn JobRepository>, pool: Arc<WorkerPool>) -> Self {
        Self { jobs, pool }
    }

    pub async fn submit(&self, request: CreateScheduleRequest) -> Result<ScheduleResponse> {
        self.submit_on(request, Local::now().date_naive()).await
    }

    /// Create a PENDING job and hand it to the worker pool without waiting
    /// for generation. A job the pool cannot take is failed straight away.
    pub async fn submit_on(
        &self,
        request: CreateScheduleRequest,
        today: NaiveDate,
    ) -> Result<ScheduleResponse> {
        let week_begin = request.validate(today)?;
        info!(
            group_id = %request.staff_group_id,
            %week_begin,
            "schedule generation requested"
        );

        let mut job = Job::new(request.staff_group_id, week_begin);
        self.jobs.insert(job.clone()).await?;

        if let Err(e) = self.pool.submit(job.id.clone()) {
            warn!(job_id = %job.id, error = %e, "could not enqueue job");
            job.fail(e.to_string())?;
            self.jobs.save(&job).await?;
            return Ok(ScheduleResponse::from(&job));
        }

        // The worker may already have touched the job; report what is stored.
        let stored = self
            .jobs
            .find(&job.id)
            .await?
            .ok_or_else(|| SchedulerError::JobNotFound(job.id.clone()))?;
        Ok(ScheduleResponse::from(&stored))
    }

    pub async fn status(&self, schedule_id: &str) -> Result<ScheduleResponse> {
        debug!(schedule_id, "fetching job status");
        let job = self.load(schedule_id).await?;
        Ok(ScheduleResponse::from(&job))
    }

    pub async fn result(&self, schedule_id: &str) -> Result<ScheduleResult> {
        debug!(schedule_id, "fetching job result");
        let job = self.load(schedule_id).await?;
        Ok(ScheduleResult {
            schedule_id: job.id.clone(),
            week_begin_date: job.week_begin_date,
            staff_group_id: job.staff_group_id.clone(),
            assignments: job.assignments().to_vec(),
        })
    }

    pub async fn list(&self, page: usize, size: usize) -> Result<Vec<ScheduleSummary>> {
        let jobs = self.jobs.list(page, size).await?;
        Ok(jobs.into_iter().map(ScheduleSummary::from).collect())
    }

    /// Run one promotion sweep over the live job store, as the daily loop
    /// would on `today`.
    pub async fn run_sweep(&self, today: NaiveDate) -> Result<SweepReport> {
        PromotionSweep::new(self.jobs.clone()).run_for(today).await
    }

    async fn load(&self, schedule_id: &str) -> Result<Job> {
        match self.jobs.find(schedule_id).await? {
            Some(job) => Ok(job),
            None => {
                error!(schedule_id, "schedule job not found");
                Err(SchedulerError::JobNotFound(schedule_id.to_string()))
            }
        }
    }
}
