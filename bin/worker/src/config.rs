//! Centralized worker configuration.
//!
//! Configuration is loaded via the `config` crate from an optional TOML file
//! followed by `GREENHOUSE_`-prefixed environment variables, using `__` between
//! sections (e.g. `GREENHOUSE_ENGINE__URL`).

use greenhouse_actuation::{NatsConfig, PublishPolicy};
use greenhouse_actuation::command::DEFAULT_PUMP_THRESHOLD;
use greenhouse_engine::{EngineClientConfig, ProcessorOptions};
use greenhouse_telemetry::{InfluxConfig, QueryTemplate};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the config file.
pub const CONFIG_FILE_ENV: &str = "GREENHOUSE_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "greenhouse.toml";

/// Errors from loading or validating configuration.
#[derive(Debug)]
pub enum WorkerConfigError {
    /// Sources could not be read or deserialized.
    Load { details: String },
    /// A value is present but unusable.
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for WorkerConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { details } => write!(f, "failed to load configuration: {details}"),
            Self::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
        }
    }
}

impl std::error::Error for WorkerConfigError {}

/// Worker configuration composed from per-service sections.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    pub engine: EngineConfig,
    pub telemetry: TelemetryConfig,
    pub broker: BrokerConfig,
    #[serde(default)]
    pub pump: PumpConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Workflow engine connection and polling.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// REST base URL, including `/engine-rest`.
    pub url: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_worker_id")]
    pub worker_id: String,
    #[serde(default = "default_max_tasks")]
    pub max_tasks: u32,
    #[serde(default = "default_max_parallel_tasks")]
    pub max_parallel_tasks_per_handler: usize,
    #[serde(default = "default_lock_duration_ms")]
    pub lock_duration_ms: u64,
    /// Long-polling timeout handed to the engine.
    #[serde(default = "default_async_response_timeout_ms")]
    pub async_response_timeout_ms: u64,
}

/// Time-series database connection and query addressing.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub url: String,
    #[serde(default)]
    pub token: String,
    pub org: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
    #[serde(default = "default_lookback_seconds")]
    pub lookback_seconds: u64,
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

/// Pub/sub broker for actuator commands.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    pub url: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Soil-driven pump control.
#[derive(Debug, Clone, Deserialize)]
pub struct PumpConfig {
    /// Whether the pump topic is registered with the engine.
    #[serde(default)]
    pub enabled: bool,
    /// Soil reading at or below which the pump runs.
    #[serde(default = "default_pump_threshold")]
    pub threshold: f64,
    #[serde(default = "default_pump_topic")]
    pub topic: String,
}

/// Static file and health server.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_worker_id() -> String {
    "GreenHouseHandler".to_string()
}

fn default_max_tasks() -> u32 {
    10
}

fn default_max_parallel_tasks() -> usize {
    100
}

fn default_lock_duration_ms() -> u64 {
    20_000
}

fn default_async_response_timeout_ms() -> u64 {
    5_000
}

fn default_bucket() -> String {
    "telegraf".to_string()
}

fn default_measurement() -> String {
    "greenhouse".to_string()
}

fn default_lookback_seconds() -> u64 {
    60
}

fn default_query_timeout_ms() -> u64 {
    10_000
}

fn default_client_name() -> String {
    "greenhouse".to_string()
}

fn default_subject() -> String {
    "greenhouse".to_string()
}

fn default_publish_timeout_ms() -> u64 {
    5_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_pump_threshold() -> f64 {
    DEFAULT_PUMP_THRESHOLD
}

fn default_pump_topic() -> String {
    "controlPump".to_string()
}

fn default_http_port() -> u16 {
    9999
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_pump_threshold(),
            topic: default_pump_topic(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl WorkerConfig {
    /// Loads configuration from the config file (if any) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn load() -> Result<Self, WorkerConfigError> {
        let path =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name(&path).required(false))
                .add_source(
                    config::Environment::with_prefix("GREENHOUSE")
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    /// Builds, deserializes and validates configuration from prepared sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the sources fail to load or the result is invalid.
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, WorkerConfigError> {
        let config: Self = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| WorkerConfigError::Load {
                details: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values the types alone cannot.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), WorkerConfigError> {
        require_non_empty("engine.url", &self.engine.url)?;
        require_non_empty("engine.worker_id", &self.engine.worker_id)?;
        require_non_empty("telemetry.url", &self.telemetry.url)?;
        require_non_empty("telemetry.org", &self.telemetry.org)?;
        require_non_empty("telemetry.bucket", &self.telemetry.bucket)?;
        require_non_empty("broker.url", &self.broker.url)?;
        require_non_empty("broker.subject", &self.broker.subject)?;
        require_non_empty("pump.topic", &self.pump.topic)?;

        if self.engine.max_tasks == 0 {
            return Err(invalid("engine.max_tasks", "must be at least 1"));
        }
        if self.engine.max_parallel_tasks_per_handler == 0 {
            return Err(invalid(
                "engine.max_parallel_tasks_per_handler",
                "must be at least 1",
            ));
        }
        if self.engine.lock_duration_ms == 0 {
            return Err(invalid("engine.lock_duration_ms", "must be positive"));
        }
        if self.telemetry.lookback_seconds == 0 {
            return Err(invalid("telemetry.lookback_seconds", "must be positive"));
        }
        if !self.pump.threshold.is_finite() {
            return Err(invalid("pump.threshold", "must be a finite number"));
        }
        Ok(())
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), WorkerConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> WorkerConfigError {
    WorkerConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

impl EngineConfig {
    /// Settings for the REST client. The HTTP timeout outlasts the long poll.
    #[must_use]
    pub fn client_config(&self) -> EngineClientConfig {
        EngineClientConfig {
            url: self.url.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            timeout: Duration::from_millis(self.async_response_timeout_ms)
                + Duration::from_secs(5),
        }
    }

    #[must_use]
    pub fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            worker_id: self.worker_id.clone(),
            lock_duration: Duration::from_millis(self.lock_duration_ms),
            max_tasks: self.max_tasks,
            max_parallel_tasks_per_handler: self.max_parallel_tasks_per_handler,
            async_response_timeout: Duration::from_millis(self.async_response_timeout_ms),
            ..ProcessorOptions::default()
        }
    }
}

impl TelemetryConfig {
    #[must_use]
    pub fn influx_config(&self) -> InfluxConfig {
        InfluxConfig {
            url: self.url.clone(),
            org: self.org.clone(),
            token: self.token.clone(),
            query_timeout: Duration::from_millis(self.query_timeout_ms),
        }
    }

    #[must_use]
    pub fn query_template(&self) -> QueryTemplate {
        QueryTemplate {
            bucket: self.bucket.clone(),
            measurement: self.measurement.clone(),
            lookback: Duration::from_secs(self.lookback_seconds),
        }
    }
}

impl BrokerConfig {
    #[must_use]
    pub fn nats_config(&self) -> NatsConfig {
        NatsConfig {
            url: self.url.clone(),
            client_name: Some(self.client_name.clone()),
            user: self.user.clone(),
            password: self.password.clone(),
            subject: Some(self.subject.clone()),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            policy: PublishPolicy {
                timeout: Duration::from_millis(self.publish_timeout_ms),
            },
        }
    }
}
