mod model;
mod outcome;
mod status;

pub use model::Job;
pub use outcome::{FailureKind, SkipReason, WorkerOutcome};
pub use status::JobStatus;
