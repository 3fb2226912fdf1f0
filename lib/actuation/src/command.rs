//! Control envelopes and pump decisions.

use greenhouse_core::Actuator;
use serde::{Deserialize, Serialize};

/// Soil reading at or below which the pump is switched on.
pub const DEFAULT_PUMP_THRESHOLD: f64 = 1500.0;

/// A command envelope received from the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMsg {
    /// Name of the sensor or actuator the command concerns.
    pub sensor: String,
    #[serde(default)]
    pub commands: ControlCommands,
}

/// Per-actuator directives. An empty string means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlCommands {
    pub fan: String,
    pub vent: String,
    pub pump: String,
}

impl ControlMsg {
    /// Decodes an envelope from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid envelope.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Actuator states the directives ask for.
    ///
    /// `on`/`off` drive the fan and pump, `open`/`close` drive the vent.
    /// Anything else is not a state change.
    #[must_use]
    pub fn requested_states(&self) -> Vec<(Actuator, bool)> {
        let directives = [
            (Actuator::Fan, self.commands.fan.as_str()),
            (Actuator::Vent, self.commands.vent.as_str()),
            (Actuator::Pump, self.commands.pump.as_str()),
        ];

        directives
            .into_iter()
            .filter_map(|(actuator, directive)| {
                let on = match (actuator, directive.trim().to_ascii_lowercase().as_str()) {
                    (Actuator::Vent, "open") => true,
                    (Actuator::Vent, "close" | "closed") => false,
                    (Actuator::Fan | Actuator::Pump, "on") => true,
                    (Actuator::Fan | Actuator::Pump, "off") => false,
                    _ => return None,
                };
                Some((actuator, on))
            })
            .collect()
    }
}

/// Command sent to the irrigation pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpCommand {
    On,
    Off,
}

impl PumpCommand {
    /// Decides the pump state for a soil reading. The threshold is inclusive.
    #[must_use]
    pub fn for_soil(soil: f64, threshold: f64) -> Self {
        if soil <= threshold { Self::On } else { Self::Off }
    }

    /// Wire payload understood by the pump controller.
    #[must_use]
    pub const fn payload(self) -> &'static str {
        match self {
            Self::On => "pump-on",
            Self::Off => "pump-off",
        }
    }

    /// Status text written back to the workflow.
    #[must_use]
    pub const fn status_message(self) -> &'static str {
        match self {
            Self::On => "pump on complete",
            Self::Off => "pump off complete",
        }
    }

    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}
