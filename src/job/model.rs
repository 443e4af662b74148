use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::status::JobStatus;
use crate::error::{Result, SchedulerError};
use crate::schedule::Assignment;

/// One request to generate a shift schedule for a staff group.
///
/// The job exclusively owns its assignments; they are only ever replaced as
/// a whole, so a job carries either a full period or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub staff_group_id: String,
    pub week_begin_date: NaiveDate,
    pub status: JobStatus,
    assignments: Vec<Assignment>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(staff_group_id: impl Into<String>, week_begin_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            staff_group_id: staff_group_id.into(),
            week_begin_date,
            status: JobStatus::Pending,
            assignments: Vec::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Move to `next`, rejecting anything outside the lifecycle table.
    pub fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(SchedulerError::InvalidTransition {
                job_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(JobStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Attach a generated period. Only a PENDING job accepts assignments.
    pub fn attach_assignments(&mut self, assignments: Vec<Assignment>) -> Result<()> {
        if self.status != JobStatus::Pending {
            return Err(SchedulerError::InvalidTransition {
                job_id: self.id.clone(),
                from: self.status,
                to: JobStatus::Pending,
            });
        }
        self.assignments = assignments;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Earliest assignment date, if any assignments exist.
    pub fn first_assignment_date(&self) -> Option<NaiveDate> {
        self.assignments.iter().map(|a| a.date).min()
    }

    /// Latest assignment date, if any assignments exist.
    pub fn last_assignment_date(&self) -> Option<NaiveDate> {
        self.assignments.iter().map(|a| a.date).max()
    }
}
