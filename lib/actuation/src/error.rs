//! Publishing error types.

use std::fmt;

/// Errors from publishing actuator commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// Could not connect to the broker.
    ConnectionFailed { message: String },
    /// The broker client refused the message.
    PublishFailed { subject: String, message: String },
    /// Buffered messages could not be flushed to the broker.
    FlushFailed { subject: String, message: String },
    /// The publish did not finish in time.
    Timeout { subject: String, after_ms: u64 },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed { message } => {
                write!(f, "failed to connect to broker: {message}")
            }
            Self::PublishFailed { subject, message } => {
                write!(f, "publish to '{subject}' failed: {message}")
            }
            Self::FlushFailed { subject, message } => {
                write!(f, "flush after publish to '{subject}' failed: {message}")
            }
            Self::Timeout { subject, after_ms } => {
                write!(f, "publish to '{subject}' timed out after {after_ms}ms")
            }
        }
    }
}

impl std::error::Error for PublishError {}
