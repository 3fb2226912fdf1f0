//! External task payloads.

use crate::variable::{Variable, VariableBag};
use serde::{Deserialize, Serialize};

/// A task locked for this worker by `fetchAndLock`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedTask {
    pub id: String,
    pub topic_name: String,
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub process_instance_id: Option<String>,
    #[serde(default)]
    pub business_key: Option<String>,
    #[serde(default)]
    pub retries: Option<i32>,
    #[serde(default)]
    pub lock_expiration_time: Option<String>,
    #[serde(default)]
    pub variables: VariableBag,
}

impl LockedTask {
    /// Creates a task with no process metadata, for tests and tooling.
    #[must_use]
    pub fn new(id: impl Into<String>, topic_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            topic_name: topic_name.into(),
            worker_id: None,
            process_instance_id: None,
            business_key: None,
            retries: None,
            lock_expiration_time: None,
            variables: VariableBag::new(),
        }
    }

    /// Adds a variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, variable: Variable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }
}

/// One topic subscription inside a fetch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTopic {
    pub topic_name: String,
    /// Lock duration in milliseconds.
    pub lock_duration: u64,
}

/// Body of `POST /external-task/fetchAndLock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchAndLockRequest {
    pub worker_id: String,
    pub max_tasks: u32,
    pub use_priority: bool,
    /// Long-polling timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub async_response_timeout: Option<u64>,
    pub topics: Vec<FetchTopic>,
}

/// Body of `POST /external-task/{id}/complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub worker_id: String,
    pub variables: VariableBag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_variables: Option<VariableBag>,
}

/// Body of `POST /external-task/{id}/failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRequest {
    pub worker_id: String,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    pub retries: i32,
    /// Milliseconds before the task may be fetched again.
    pub retry_timeout: u64,
}
