//! Sensor telemetry for the greenhouse worker.
//!
//! Builds Flux queries for a sensor's trailing window, runs them through a
//! [`SensorStore`], and reduces the raw values to a NaN-free average.

pub mod average;
pub mod error;
pub mod query;
pub mod store;

pub use average::{Average, average_samples};
pub use error::QueryError;
pub use query::{FluxQuery, QueryTemplate};
pub use store::{InfluxConfig, InfluxSensorStore, SensorStore};
