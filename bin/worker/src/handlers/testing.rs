//! In-memory collaborators for handler tests.

use async_trait::async_trait;
use greenhouse_actuation::{CommandPublisher, PublishError};
use greenhouse_engine::{
    CompleteRequest, EngineError, ExternalTaskApi, FailureRequest, FetchAndLockRequest,
    LockedTask, TaskContext,
};
use greenhouse_telemetry::{FluxQuery, QueryError, SensorStore};
use rootcause::prelude::Report;
use std::sync::{Arc, Mutex};

/// Records completions; optionally rejects them.
#[derive(Default)]
pub struct RecordingEngine {
    pub completed: Mutex<Vec<(String, CompleteRequest)>>,
    pub reject_completion: bool,
}

impl RecordingEngine {
    pub fn rejecting() -> Self {
        Self {
            reject_completion: true,
            ..Self::default()
        }
    }

    pub fn completions(&self) -> Vec<(String, CompleteRequest)> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExternalTaskApi for RecordingEngine {
    async fn fetch_and_lock(
        &self,
        _request: &FetchAndLockRequest,
    ) -> Result<Vec<LockedTask>, Report<EngineError>> {
        Ok(Vec::new())
    }

    async fn complete(
        &self,
        task_id: &str,
        request: &CompleteRequest,
    ) -> Result<(), Report<EngineError>> {
        if self.reject_completion {
            return Err(EngineError::UnexpectedStatus {
                status: 404,
                body: "task is not locked".to_string(),
            }
            .into());
        }
        self.completed
            .lock()
            .unwrap()
            .push((task_id.to_string(), request.clone()));
        Ok(())
    }

    async fn handle_failure(
        &self,
        _task_id: &str,
        _request: &FailureRequest,
    ) -> Result<(), Report<EngineError>> {
        Ok(())
    }
}

/// Returns fixed values, or fails every query.
pub struct FakeStore {
    values: Vec<String>,
    fail: bool,
    pub queries: Mutex<Vec<FluxQuery>>,
}

impl FakeStore {
    pub fn with_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_values(Vec::<String>::new())
        }
    }
}

#[async_trait]
impl SensorStore for FakeStore {
    async fn raw_values(&self, query: &FluxQuery) -> Result<Vec<String>, Report<QueryError>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(QueryError::QueryFailed {
                details: "bucket not found".to_string(),
            }
            .into());
        }
        Ok(self.values.clone())
    }
}

/// Records published messages; optionally rejects them.
#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandPublisher for RecordingPublisher {
    async fn publish(&self, subject: &str, payload: &str) -> Result<(), Report<PublishError>> {
        if self.fail {
            return Err(PublishError::Timeout {
                subject: subject.to_string(),
                after_ms: 5000,
            }
            .into());
        }
        self.published
            .lock()
            .unwrap()
            .push((subject.to_string(), payload.to_string()));
        Ok(())
    }
}

/// A context for `task` backed by `engine`.
pub fn context(task: LockedTask, engine: &Arc<RecordingEngine>) -> TaskContext {
    let api: Arc<dyn ExternalTaskApi> = engine.clone();
    TaskContext::new(task, "GreenHouseHandler", api)
}
