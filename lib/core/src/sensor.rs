//! The greenhouse sensor catalogue.
//!
//! Each sensor kind ties together the workflow topic that asks for it, the
//! time-series field it is stored under, and the task variable the averaged
//! reading is written back to.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A sensor whose readings can be averaged on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// CO2 concentration in ppm.
    Co2,
    /// Air temperature in degrees Celsius.
    Temperature,
    /// Raw soil moisture reading.
    Soil,
    /// Relative humidity.
    Humidity,
}

impl SensorKind {
    /// Every sensor kind, in registration order.
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Co2,
        SensorKind::Temperature,
        SensorKind::Soil,
        SensorKind::Humidity,
    ];

    /// Workflow topic that requests a reading for this sensor.
    #[must_use]
    pub const fn topic(self) -> &'static str {
        match self {
            Self::Co2 => "checkCO2",
            Self::Temperature => "checkTemp",
            Self::Soil => "checkSoil",
            Self::Humidity => "checkHumidity",
        }
    }

    /// Field name in the time-series measurement.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::Co2 => "co2",
            Self::Temperature => "temp_c",
            Self::Soil => "soil",
            Self::Humidity => "humidity",
        }
    }

    /// Task variable the averaged reading is written to.
    #[must_use]
    pub const fn variable_name(self) -> &'static str {
        match self {
            Self::Co2 => "co2",
            Self::Temperature => "temp",
            Self::Soil => "soil",
            Self::Humidity => "humidity",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Co2 => write!(f, "co2"),
            Self::Temperature => write!(f, "temperature"),
            Self::Soil => write!(f, "soil"),
            Self::Humidity => write!(f, "humidity"),
        }
    }
}
