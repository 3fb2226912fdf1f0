//! Core domain types for the greenhouse task worker.
//!
//! This crate provides the sensor catalogue and the in-process crop snapshot
//! shared by the handlers.

pub mod sensor;
pub mod state;

pub use sensor::SensorKind;
pub use state::{Actuator, CropState, GrowHouse};
