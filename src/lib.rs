//! Background shift-schedule generation.
//!
//! A submitted [`job::Job`] is queued on the [`pool::WorkerPool`]; a
//! [`worker::GenerationWorker`] takes a per-job lock, resolves the staff of
//! the group through the [`membership`] client and runs the
//! [`schedule::AssignmentGenerator`]. A daily [`sweep::PromotionSweep`] moves
//! jobs through PROCESSING and COMPLETED as their dates pass.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod lock;
pub mod membership;
pub mod pool;
pub mod schedule;
pub mod service;
pub mod store;
pub mod sweep;
pub mod telemetry;
pub mod ui;
pub mod worker;
