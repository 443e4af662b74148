use std::fmt;

use super::status::JobStatus;

/// Why the worker left a job untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Another holder owns the job's lock.
    LockContention,
    /// No job with that id exists.
    NotFound,
    /// The job has already left PENDING.
    NotPending(JobStatus),
    /// The job is still PENDING but already carries its schedule.
    AlreadyGenerated,
}

/// Distinguishes expected business failures from unexpected ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Expected outcome of the inputs, e.g. a group with no members.
    Business(String),
    /// Anything that went wrong while generating or persisting.
    Unexpected(String),
}

impl FailureKind {
    pub fn message(&self) -> &str {
        match self {
            FailureKind::Business(msg) | FailureKind::Unexpected(msg) => msg,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Business(msg) => write!(f, "Business failure: {msg}"),
            FailureKind::Unexpected(msg) => write!(f, "Unexpected failure: {msg}"),
        }
    }
}

/// The result of one generation attempt for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    Generated { assignments: usize },
    Skipped(SkipReason),
    Failed(FailureKind),
}
