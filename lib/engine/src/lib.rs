//! Workflow engine integration for the greenhouse worker.
//!
//! This crate speaks the engine's external task protocol:
//!
//! - **Variables**: typed task variables and the variable bag
//! - **Tasks**: locked tasks and the request bodies for fetch/complete/failure
//! - **Client**: a `reqwest`-backed REST client behind [`ExternalTaskApi`]
//! - **Processor**: long-polling dispatcher routing tasks to [`TaskHandler`]s

pub mod client;
pub mod error;
pub mod processor;
pub mod task;
pub mod variable;

pub use client::{EngineClient, EngineClientConfig, ExternalTaskApi};
pub use error::{EngineError, HandlerError};
pub use processor::{Processor, ProcessorOptions, TaskContext, TaskHandler};
pub use task::{CompleteRequest, FailureRequest, FetchAndLockRequest, FetchTopic, LockedTask};
pub use variable::{Variable, VariableBag};
