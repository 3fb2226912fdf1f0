//! NATS integration for actuator commands.
//!
//! Actuators subscribe to a single subject. MQTT field devices reach the same
//! subject through the NATS server's MQTT gateway.

use crate::error::PublishError;
use crate::policy::{CommandPublisher, PublishPolicy};
use async_trait::async_trait;
use rootcause::prelude::Report;
use std::time::Duration;
use tracing::{info, instrument};

/// Default subject the actuators listen on.
const ACTUATOR_SUBJECT: &str = "greenhouse";

/// Default client name announced to the broker.
const CLIENT_NAME: &str = "greenhouse";

/// Configuration for the NATS publisher.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URL.
    pub url: String,
    /// Client name (defaults to greenhouse).
    pub client_name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Actuator subject (defaults to greenhouse).
    pub subject: Option<String>,
    pub connect_timeout: Duration,
    pub policy: PublishPolicy,
}

impl NatsConfig {
    /// Creates a new config with the given NATS URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_name: None,
            user: None,
            password: None,
            subject: None,
            connect_timeout: Duration::from_secs(10),
            policy: PublishPolicy::default(),
        }
    }

    /// Subject actuator commands are published on.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or(ACTUATOR_SUBJECT)
    }

    fn client_name(&self) -> &str {
        self.client_name.as_deref().unwrap_or(CLIENT_NAME)
    }

    fn options(&self) -> async_nats::ConnectOptions {
        let options = match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), password) if !user.is_empty() => async_nats::ConnectOptions::new()
                .user_and_password(user.to_string(), password.unwrap_or_default().to_string()),
            _ => async_nats::ConnectOptions::new(),
        };
        options
            .name(self.client_name())
            .connection_timeout(self.connect_timeout)
    }
}

/// Long-lived NATS publisher shared by every handler.
#[derive(Clone)]
pub struct NatsPublisher {
    client: async_nats::Client,
    policy: PublishPolicy,
}

impl NatsPublisher {
    /// Connects to the broker.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(config: &NatsConfig) -> Result<Self, Report<PublishError>> {
        let client = config
            .options()
            .connect(config.url.as_str())
            .await
            .map_err(|e| PublishError::ConnectionFailed {
                message: e.to_string(),
            })?;

        info!(url = %config.url, subject = config.subject(), "connected to broker");
        Ok(Self {
            client,
            policy: config.policy,
        })
    }

    /// Flushes anything still buffered. Called once on shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub async fn close(&self) -> Result<(), Report<PublishError>> {
        self.client
            .flush()
            .await
            .map_err(|e| PublishError::FlushFailed {
                subject: String::new(),
                message: e.to_string(),
            })?;
        info!("broker connection flushed");
        Ok(())
    }
}

#[async_trait]
impl CommandPublisher for NatsPublisher {
    #[instrument(skip(self, payload))]
    async fn publish(&self, subject: &str, payload: &str) -> Result<(), Report<PublishError>> {
        self.policy
            .run(subject, async {
                self.client
                    .publish(subject.to_string(), payload.to_owned().into())
                    .await
                    .map_err(|e| PublishError::PublishFailed {
                        subject: subject.to_string(),
                        message: e.to_string(),
                    })?;

                self.client
                    .flush()
                    .await
                    .map_err(|e| PublishError::FlushFailed {
                        subject: subject.to_string(),
                        message: e.to_string(),
                    })?;

                Ok::<(), Report<PublishError>>(())
            })
            .await
    }
}
