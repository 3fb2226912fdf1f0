//! Typed task variables.
//!
//! The engine exchanges variables as `{"type": ..., "value": ..., "valueInfo": ...}`
//! objects keyed by variable name.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// The variables attached to a task, keyed by name.
pub type VariableBag = HashMap<String, Variable>;

/// A single typed variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Engine type tag, e.g. `Double` or `String`.
    #[serde(rename = "type", default)]
    pub value_type: String,
    #[serde(default)]
    pub value: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_info: Option<JsonValue>,
}

impl Variable {
    /// A `Double` variable.
    #[must_use]
    pub fn double(value: f64) -> Self {
        Self::typed("Double", JsonValue::from(value))
    }

    /// A `String` variable.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed("String", JsonValue::String(value.into()))
    }

    fn typed(value_type: &str, value: JsonValue) -> Self {
        Self {
            value_type: value_type.to_string(),
            value,
            value_info: None,
        }
    }

    /// Renders the value as plain text.
    ///
    /// Strings come back without quotes, `null` as an empty string, and every
    /// other value in its JSON form.
    #[must_use]
    pub fn value_text(&self) -> String {
        match &self.value {
            JsonValue::String(s) => s.clone(),
            JsonValue::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Returns the value as a float, parsing strings if needed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
