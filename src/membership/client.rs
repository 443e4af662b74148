use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::StaffDirectory;
use super::breaker::{BreakerState, CircuitBreaker};
use super::error::MembershipError;
use crate::config::{MembershipConfig, RetryConfig};

/// HTTP client for the staff directory's group membership endpoint.
pub struct MembershipClient {
    client: Client,
    base_url: Url,
    retry: RetryConfig,
    breaker: CircuitBreaker,
}

impl MembershipClient {
    pub fn new(config: &MembershipConfig) -> Result<Self, MembershipError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| MembershipError::Config(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(MembershipError::Config(format!(
                "{} cannot be used as a base url",
                config.base_url
            )));
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.response_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url,
            retry: config.retry.clone(),
            breaker: CircuitBreaker::new(config.breaker.clone()),
        })
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    fn members_url(&self, group_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["staff-groups", group_id, "members"]);
        }
        url
    }

    /// A single request, classified by status code.
    pub async fn fetch_members(&self, group_id: &str) -> Result<BTreeSet<String>, MembershipError> {
        let response = self
            .client
            .get(self.members_url(group_id))
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            warn!(group_id, "staff group not found in directory");
            return Err(MembershipError::NotFound(group_id.to_string()));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            error!(group_id, status = status.as_u16(), "directory returned an error");
            return Err(if status.is_server_error() {
                MembershipError::Server {
                    status: status.as_u16(),
                    message,
                }
            } else {
                MembershipError::Client {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let members = response.json::<Vec<String>>().await.map_err(|e| {
            if e.is_decode() {
                MembershipError::InvalidBody(e.to_string())
            } else {
                MembershipError::Network(e)
            }
        })?;
        Ok(members.into_iter().collect())
    }

    /// Fetch through the circuit breaker, retrying retryable failures with
    /// exponential backoff. Non-retryable failures return immediately.
    pub async fn fetch_with_retry(
        &self,
        group_id: &str,
    ) -> Result<BTreeSet<String>, MembershipError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            if !self.breaker.try_acquire() {
                return Err(MembershipError::CircuitOpen);
            }

            match self.fetch_members(group_id).await {
                Ok(members) => {
                    self.breaker.record_success();
                    return Ok(members);
                }
                Err(e) if e.is_retryable() => {
                    self.breaker.record_failure();
                    if attempt >= self.retry.max_attempts {
                        return Err(e);
                    }
                    let delay_ms = self.retry.delay_for_attempt(attempt);
                    warn!(
                        group_id,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms,
                        error = %e,
                        "retrying directory lookup"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => {
                    // The directory answered, so it is healthy.
                    self.breaker.record_success();
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait]
impl StaffDirectory for MembershipClient {
    async fn staff_for_group(&self, group_id: &str) -> BTreeSet<String> {
        info!(group_id, "fetching staff for group");
        match self.fetch_with_retry(group_id).await {
            Ok(members) => members,
            Err(e) => {
                error!(
                    group_id,
                    error = %e,
                    "directory lookup failed, falling back to an empty staff set"
                );
                BTreeSet::new()
            }
        }
    }
}
