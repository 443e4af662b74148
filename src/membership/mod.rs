//! Staff membership lookup against the external directory service.

mod breaker;
mod client;
mod error;

use std::collections::BTreeSet;

use async_trait::async_trait;

pub use breaker::{BreakerState, CircuitBreaker};
pub use client::MembershipClient;
pub use error::MembershipError;

/// Resolves the staff ids belonging to a group.
///
/// Implementations never fail: an unreachable directory and an empty group
/// both come back as an empty set.
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    async fn staff_for_group(&self, group_id: &str) -> BTreeSet<String>;
}
