//! The publish seam and its timeout policy.

use crate::error::PublishError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

/// Publishes a payload on a subject and waits for the broker to take it.
///
/// This abstraction allows testing handlers without a broker.
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    async fn publish(&self, subject: &str, payload: &str) -> Result<(), Report<PublishError>>;
}

/// Every publish is awaited, bounded by `timeout`, and its outcome logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishPolicy {
    pub timeout: Duration,
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

impl PublishPolicy {
    /// Runs a publish attempt under the policy.
    ///
    /// # Errors
    ///
    /// Returns the attempt's error, or `Timeout` if it ran too long.
    pub async fn run<F>(&self, subject: &str, attempt: F) -> Result<(), Report<PublishError>>
    where
        F: Future<Output = Result<(), Report<PublishError>>>,
    {
        let outcome = match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout {
                subject: subject.to_string(),
                after_ms: self.timeout.as_millis() as u64,
            }
            .into()),
        };

        match &outcome {
            Ok(()) => debug!(subject, "published"),
            Err(e) => error!(subject, error = %e, "publish failed"),
        }
        outcome
    }
}
