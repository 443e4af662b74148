pub mod calendar;
mod generator;
mod rules;
mod shift;

pub use generator::{AssignmentGenerator, GenerationError};
pub use rules::{DayOffRule, RuleConfig};
pub use shift::{Assignment, ShiftKind};
