use thiserror::Error;

use crate::job::JobStatus;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Schedule job not found with ID: {0}")]
    JobNotFound(String),

    #[error("Invalid status transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = SchedulerError::JobNotFound("abc".into());
        assert_eq!(err.to_string(), "Schedule job not found with ID: abc");
    }

    #[test]
    fn invalid_transition_display() {
        let err = SchedulerError::InvalidTransition {
            job_id: "j1".into(),
            from: JobStatus::Completed,
            to: JobStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition for job j1: COMPLETED -> PENDING"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchedulerError>();
    }
}
