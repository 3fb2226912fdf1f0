//! Flux query construction.

use greenhouse_core::SensorKind;
use std::fmt;
use std::time::Duration;

/// A query for every sample of one field over a trailing window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxQuery {
    pub bucket: String,
    pub measurement: String,
    pub field: String,
    pub lookback: Duration,
}

impl FluxQuery {
    /// Renders the query as Flux source.
    #[must_use]
    pub fn to_flux(&self) -> String {
        format!(
            "from(bucket: {bucket})\n  \
             |> range(start: -{secs}s)\n  \
             |> filter(fn: (r) => r[\"_measurement\"] == {measurement})\n  \
             |> filter(fn: (r) => r[\"_field\"] == {field})",
            bucket = flux_string(&self.bucket),
            secs = self.lookback.as_secs().max(1),
            measurement = flux_string(&self.measurement),
            field = flux_string(&self.field),
        )
    }
}

impl fmt::Display for FluxQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} (-{}s)",
            self.bucket,
            self.measurement,
            self.field,
            self.lookback.as_secs()
        )
    }
}

/// Quotes a Flux string literal.
fn flux_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Shared addressing for every sensor query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub bucket: String,
    pub measurement: String,
    pub lookback: Duration,
}

impl QueryTemplate {
    /// Builds the query for one sensor.
    #[must_use]
    pub fn for_sensor(&self, kind: SensorKind) -> FluxQuery {
        FluxQuery {
            bucket: self.bucket.clone(),
            measurement: self.measurement.clone(),
            field: kind.field().to_string(),
            lookback: self.lookback,
        }
    }
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self {
            bucket: "telegraf".to_string(),
            measurement: "greenhouse".to_string(),
            lookback: Duration::from_secs(60),
        }
    }
}
