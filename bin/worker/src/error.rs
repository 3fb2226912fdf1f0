//! Startup and shutdown errors for the worker process.

use crate::config::WorkerConfigError;
use std::fmt;

/// Errors that stop the worker.
#[derive(Debug)]
pub enum WorkerError {
    /// Configuration could not be loaded.
    Config(WorkerConfigError),
    /// The engine client could not be created.
    EngineSetup { details: String },
    /// The broker connection could not be established.
    BrokerConnect { details: String },
    /// The HTTP server failed to bind or serve.
    Http(std::io::Error),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::EngineSetup { details } => write!(f, "engine client setup failed: {details}"),
            Self::BrokerConnect { details } => write!(f, "broker connection failed: {details}"),
            Self::Http(e) => write!(f, "http server error: {e}"),
        }
    }
}

impl std::error::Error for WorkerError {}

impl From<WorkerConfigError> for WorkerError {
    fn from(e: WorkerConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(e: std::io::Error) -> Self {
        Self::Http(e)
    }
}
