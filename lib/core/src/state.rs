//! Last-known greenhouse state.
//!
//! `CropState` is created by the caller and handed to every handler that
//! needs it. All writes go through its methods; readers take a copy with
//! [`CropState::snapshot`].

use crate::sensor::SensorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Snapshot of the last-known sensor values and actuator states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowHouse {
    /// Display name of the grow house.
    pub name: String,
    pub humidity: f64,
    pub soil: f64,
    pub temperature: f64,
    pub co2: f64,
    pub door_open: bool,
    pub fan_on: bool,
    pub pump_on: bool,
    /// When any field was last written.
    pub updated_at: Option<DateTime<Utc>>,
}

impl GrowHouse {
    /// Creates a snapshot with every reading at zero and every actuator off.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            humidity: 0.0,
            soil: 0.0,
            temperature: 0.0,
            co2: 0.0,
            door_open: false,
            fan_on: false,
            pump_on: false,
            updated_at: None,
        }
    }
}

impl Default for GrowHouse {
    fn default() -> Self {
        Self::new("GrowHouse")
    }
}

/// An actuator whose state is tracked in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actuator {
    Fan,
    /// The vent; tracked as `door_open`.
    Vent,
    Pump,
}

/// Shared handle to the grow house snapshot.
///
/// Last writer wins. Handlers for different sensors write disjoint fields.
#[derive(Debug, Clone, Default)]
pub struct CropState {
    inner: Arc<RwLock<GrowHouse>>,
}

impl CropState {
    /// Creates a handle around an initial snapshot.
    #[must_use]
    pub fn new(initial: GrowHouse) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Stores an averaged reading for a sensor.
    pub fn record_reading(&self, kind: SensorKind, value: f64) {
        self.update(|house| match kind {
            SensorKind::Co2 => house.co2 = value,
            SensorKind::Temperature => house.temperature = value,
            SensorKind::Soil => house.soil = value,
            SensorKind::Humidity => house.humidity = value,
        });
    }

    /// Records the commanded state of an actuator.
    pub fn set_actuator(&self, actuator: Actuator, on: bool) {
        self.update(|house| match actuator {
            Actuator::Fan => house.fan_on = on,
            Actuator::Vent => house.door_open = on,
            Actuator::Pump => house.pump_on = on,
        });
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> GrowHouse {
        // A poisoned snapshot is still a valid snapshot.
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, apply: impl FnOnce(&mut GrowHouse)) {
        let mut house = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut house);
        house.updated_at = Some(Utc::now());
    }
}
