use std::sync::{Mutex, PoisonError};

use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::BreakerConfig;

/// Observable breaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
enum Inner {
    Closed { failures: u32 },
    Open { until: Instant },
    HalfOpen,
}

/// Consecutive-failure circuit breaker.
///
/// After `failure_threshold` consecutive failures the breaker opens and
/// rejects calls for `open_secs`. The first call after that runs as a trial
/// and other calls are rejected until it reports back: success closes the
/// breaker, failure opens it again.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner::Closed { failures: 0 }),
        }
    }

    pub fn state(&self) -> BreakerState {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match *inner {
            Inner::Closed { .. } => BreakerState::Closed,
            Inner::Open { until } if Instant::now() >= until => BreakerState::HalfOpen,
            Inner::Open { .. } => BreakerState::Open,
            Inner::HalfOpen => BreakerState::HalfOpen,
        }
    }

    /// Whether a call may go through right now.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match *inner {
            Inner::Closed { .. } => true,
            // A trial call is already in flight.
            Inner::HalfOpen => false,
            Inner::Open { until } if Instant::now() >= until => {
                info!("circuit breaker half-open, allowing trial call");
                *inner = Inner::HalfOpen;
                true
            }
            Inner::Open { .. } => false,
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*inner, Inner::HalfOpen) {
            info!("circuit breaker closed after successful trial call");
        }
        *inner = Inner::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let open_for = self.config.open_duration();
        match *inner {
            Inner::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.config.failure_threshold {
                    warn!(failures, open_secs = self.config.open_secs, "circuit breaker opened");
                    *inner = Inner::Open {
                        until: Instant::now() + open_for,
                    };
                } else {
                    *inner = Inner::Closed { failures };
                }
            }
            Inner::HalfOpen => {
                warn!("trial call failed, circuit breaker re-opened");
                *inner = Inner::Open {
                    until: Instant::now() + open_for,
                };
            }
            Inner::Open { .. } => {}
        }
    }
}
