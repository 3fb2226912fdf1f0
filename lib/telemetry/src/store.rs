//! Sample storage backends.

use crate::error::QueryError;
use crate::query::FluxQuery;
use async_trait::async_trait;
use influxdb2::models::Query;
use influxdb2_structmap::value::Value;
use rootcause::prelude::Report;
use std::time::Duration;
use tracing::{debug, instrument};

/// Column holding a record's sample value.
const VALUE_COLUMN: &str = "_value";

/// Source of raw sensor samples.
///
/// This abstraction allows testing the query handlers without InfluxDB.
#[async_trait]
pub trait SensorStore: Send + Sync {
    /// Returns the raw `_value` of every record the query yields, as text.
    async fn raw_values(&self, query: &FluxQuery) -> Result<Vec<String>, Report<QueryError>>;
}

/// Connection settings for [`InfluxSensorStore`].
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub org: String,
    pub token: String,
    pub query_timeout: Duration,
}

/// InfluxDB 2 backed sample store. One client is shared by every query.
#[derive(Clone)]
pub struct InfluxSensorStore {
    client: influxdb2::Client,
    query_timeout: Duration,
}

impl InfluxSensorStore {
    /// Creates a store from its config.
    #[must_use]
    pub fn new(config: &InfluxConfig) -> Self {
        Self {
            client: influxdb2::Client::new(&config.url, &config.org, &config.token),
            query_timeout: config.query_timeout,
        }
    }
}

#[async_trait]
impl SensorStore for InfluxSensorStore {
    #[instrument(skip(self), fields(query = %query))]
    async fn raw_values(&self, query: &FluxQuery) -> Result<Vec<String>, Report<QueryError>> {
        let request = self.client.query_raw(Some(Query::new(query.to_flux())));
        let records = tokio::time::timeout(self.query_timeout, request)
            .await
            .map_err(|_| QueryError::Timeout {
                after_ms: self.query_timeout.as_millis() as u64,
            })?
            .map_err(|e| QueryError::QueryFailed {
                details: e.to_string(),
            })?;

        let values: Vec<String> = records
            .iter()
            .filter_map(|record| record.values.get(VALUE_COLUMN))
            .map(value_text)
            .collect();

        debug!(records = records.len(), values = values.len(), "query returned");
        Ok(values)
    }
}

/// Renders a record value the way it would be printed.
fn value_text(value: &Value) -> String {
    match value {
        Value::Double(v) => v.to_string(),
        Value::Long(v) => v.to_string(),
        Value::UnsignedLong(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Bool(v) => v.to_string(),
        other => format!("{other:?}"),
    }
}
