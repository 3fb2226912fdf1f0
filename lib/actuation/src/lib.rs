//! Actuator commands for the greenhouse worker.
//!
//! Field actuators (fan, vent, pump) listen on a single pub/sub subject.
//! This crate decodes control envelopes, decides pump commands, and publishes
//! through a [`CommandPublisher`] under one bounded [`PublishPolicy`].

pub mod command;
pub mod error;
pub mod nats;
pub mod policy;

pub use command::{ControlCommands, ControlMsg, PumpCommand};
pub use error::PublishError;
pub use nats::{NatsConfig, NatsPublisher};
pub use policy::{CommandPublisher, PublishPolicy};
