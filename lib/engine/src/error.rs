//! Error types for the engine crate.
//!
//! - `EngineError`: failures talking to the workflow engine's REST API
//! - `HandlerError`: failures reported by task handlers to the processor

use std::fmt;

/// Errors from the external task REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The HTTP client could not be built.
    ClientSetup { details: String },
    /// The request could not be sent or the connection failed.
    RequestFailed { details: String },
    /// The engine answered with a non-success status.
    UnexpectedStatus { status: u16, body: String },
    /// The response body could not be decoded.
    DecodeFailed { details: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientSetup { details } => {
                write!(f, "failed to build engine client: {details}")
            }
            Self::RequestFailed { details } => write!(f, "engine request failed: {details}"),
            Self::UnexpectedStatus { status, body } => {
                write!(f, "engine returned status {status}: {body}")
            }
            Self::DecodeFailed { details } => {
                write!(f, "failed to decode engine response: {details}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Errors a task handler hands back to the processor.
///
/// Any error leaves the task locked; the engine redelivers it once the lock
/// expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// A task variable was missing or malformed.
    InvalidInput { message: String },
    /// A collaborating service failed.
    ExternalService { service: String, message: String },
    /// The engine rejected the completion call.
    CompletionFailed { task_id: String, message: String },
    /// The handler went away without reporting an outcome.
    Aborted,
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { message } => write!(f, "invalid input: {message}"),
            Self::ExternalService { service, message } => {
                write!(f, "external service error ({service}): {message}")
            }
            Self::CompletionFailed { task_id, message } => {
                write!(f, "failed to complete task {task_id}: {message}")
            }
            Self::Aborted => write!(f, "handler aborted before reporting"),
        }
    }
}

impl std::error::Error for HandlerError {}

impl HandlerError {
    /// Shorthand for an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for an external service error.
    pub fn external(service: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_display() {
        let err = EngineError::UnexpectedStatus {
            status: 404,
            body: "task not found".to_string(),
        };
        assert_eq!(err.to_string(), "engine returned status 404: task not found");
    }

    #[test]
    fn external_service_display_names_service() {
        let err = HandlerError::external("influxdb", "connection refused");
        assert!(err.to_string().contains("influxdb"));
        assert!(err.to_string().contains("connection refused"));
    }
}
