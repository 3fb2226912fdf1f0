//! Greenhouse external task worker.
//!
//! Wires the workflow engine's topics to the sensor query, control and pump
//! handlers, and serves the static dashboard.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
