//! REST client for the engine's external task API.

use crate::error::EngineError;
use crate::task::{CompleteRequest, FailureRequest, FetchAndLockRequest, LockedTask};
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// The subset of the external task API the worker uses.
///
/// This abstraction allows testing the processor and handlers without an engine.
#[async_trait]
pub trait ExternalTaskApi: Send + Sync {
    /// Fetches and locks up to `max_tasks` tasks on the requested topics.
    async fn fetch_and_lock(
        &self,
        request: &FetchAndLockRequest,
    ) -> Result<Vec<LockedTask>, Report<EngineError>>;

    /// Completes a locked task, submitting its variables.
    async fn complete(
        &self,
        task_id: &str,
        request: &CompleteRequest,
    ) -> Result<(), Report<EngineError>>;

    /// Reports a failure for a locked task.
    async fn handle_failure(
        &self,
        task_id: &str,
        request: &FailureRequest,
    ) -> Result<(), Report<EngineError>>;
}

/// Connection settings for [`EngineClient`].
#[derive(Debug, Clone)]
pub struct EngineClientConfig {
    /// Base URL including `/engine-rest`.
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Per-request timeout. Must exceed the long-polling timeout.
    pub timeout: Duration,
}

impl EngineClientConfig {
    /// Creates a config with no credentials and a 10 second timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user: None,
            password: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// `reqwest`-backed engine client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EngineClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, Option<String>)>,
}

impl EngineClient {
    /// Builds a client from its config.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: EngineClientConfig) -> Result<Self, Report<EngineError>> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::ClientSetup {
                details: e.to_string(),
            })?;

        let credentials = config
            .user
            .filter(|user| !user.is_empty())
            .map(|user| (user, config.password));

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/external-task/{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, Report<EngineError>> {
        let mut request = self.http.post(self.endpoint(path)).json(body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::RequestFailed {
                details: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(EngineError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

#[async_trait]
impl ExternalTaskApi for EngineClient {
    #[instrument(skip(self, request), fields(worker_id = %request.worker_id))]
    async fn fetch_and_lock(
        &self,
        request: &FetchAndLockRequest,
    ) -> Result<Vec<LockedTask>, Report<EngineError>> {
        let tasks: Vec<LockedTask> = self
            .post("fetchAndLock", request)
            .await?
            .json()
            .await
            .map_err(|e| EngineError::DecodeFailed {
                details: e.to_string(),
            })?;

        debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    #[instrument(skip(self, request))]
    async fn complete(
        &self,
        task_id: &str,
        request: &CompleteRequest,
    ) -> Result<(), Report<EngineError>> {
        self.post(&format!("{task_id}/complete"), request).await?;
        Ok(())
    }

    #[instrument(skip(self, request))]
    async fn handle_failure(
        &self,
        task_id: &str,
        request: &FailureRequest,
    ) -> Result<(), Report<EngineError>> {
        self.post(&format!("{task_id}/failure"), request).await?;
        Ok(())
    }
}
