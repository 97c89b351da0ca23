//! Agent configuration.
//!
//! Values are layered, lowest priority first: built-in defaults, an optional
//! TOML file, then environment variables. Environment variable names are the
//! upper-cased keys (`MQTT_BROKER`, `READ_INTERVAL_SECONDS`, ...). Empty
//! variables are treated as unset.
//!
//! ```toml
//! mqtt_broker = "broker.local"
//! mqtt_topic = "greenhouse/temperature"
//! read_interval_seconds = 60
//! payload_format = "json"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::device::{DEFAULT_PATTERN, DEFAULT_ROOT};
use crate::error::ConfigError;
use crate::publish::{BrokerSettings, PayloadFormat};

/// Longest accepted read interval, connect timeout and reconnect delay.
pub const MAX_DURATION_SECONDS: u64 = 86_400;

/// Largest keep-alive the MQTT CONNECT packet can carry.
pub const MAX_KEEP_ALIVE_SECONDS: u64 = u16::MAX as u64;

/// Complete configuration for one agent process.
#[derive(Clone, Deserialize)]
pub struct AgentConfig {
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub mqtt_username: String,
    pub mqtt_password: String,
    pub mqtt_topic: String,
    pub mqtt_client_id: String,
    pub mqtt_keep_alive_seconds: u64,
    pub mqtt_connect_timeout_seconds: u64,
    pub mqtt_reconnect_delay_seconds: u64,
    pub read_interval_seconds: u64,
    pub sensor_root: PathBuf,
    pub sensor_pattern: String,
    /// Read this device instead of the first match.
    pub sensor_id: Option<String>,
    pub payload_format: PayloadFormat,
}

impl AgentConfig {
    /// Load configuration from defaults, `path` (if given) and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, Environment::default())
    }

    fn load_with(path: Option<&Path>, environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("mqtt_broker", "localhost")?
            .set_default("mqtt_port", 1883_i64)?
            .set_default("mqtt_username", "")?
            .set_default("mqtt_password", "")?
            .set_default("mqtt_topic", "sensors/temperature")?
            .set_default("mqtt_client_id", "ds18b20-sensor")?
            .set_default("mqtt_keep_alive_seconds", 30_i64)?
            .set_default("mqtt_connect_timeout_seconds", 30_i64)?
            .set_default("mqtt_reconnect_delay_seconds", 5_i64)?
            .set_default("read_interval_seconds", 30_i64)?
            .set_default("sensor_root", DEFAULT_ROOT)?
            .set_default("sensor_pattern", DEFAULT_PATTERN)?
            .set_default("payload_format", "legacy")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config: Self = builder
            .add_source(environment.ignore_empty(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that load fine but cannot drive the agent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt_broker.is_empty() {
            return Err(ConfigError::Invalid("mqtt_broker must not be empty".into()));
        }
        if self.mqtt_topic.is_empty() {
            return Err(ConfigError::Invalid("mqtt_topic must not be empty".into()));
        }
        check_range(
            "read_interval_seconds",
            self.read_interval_seconds,
            1,
            MAX_DURATION_SECONDS,
        )?;
        check_range(
            "mqtt_keep_alive_seconds",
            self.mqtt_keep_alive_seconds,
            1,
            MAX_KEEP_ALIVE_SECONDS,
        )?;
        check_range(
            "mqtt_connect_timeout_seconds",
            self.mqtt_connect_timeout_seconds,
            1,
            MAX_DURATION_SECONDS,
        )?;
        check_range(
            "mqtt_reconnect_delay_seconds",
            self.mqtt_reconnect_delay_seconds,
            0,
            MAX_DURATION_SECONDS,
        )?;
        Ok(())
    }

    /// Time between poll cycles.
    pub fn read_interval(&self) -> Duration {
        Duration::from_secs(self.read_interval_seconds)
    }

    /// Session settings for the publisher.
    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings {
            host: self.mqtt_broker.clone(),
            port: self.mqtt_port,
            username: self.mqtt_username.clone(),
            password: self.mqtt_password.clone(),
            client_id: self.mqtt_client_id.clone(),
            topic: self.mqtt_topic.clone(),
            keep_alive: Duration::from_secs(self.mqtt_keep_alive_seconds),
            connect_timeout: Duration::from_secs(self.mqtt_connect_timeout_seconds),
            reconnect_delay: Duration::from_secs(self.mqtt_reconnect_delay_seconds),
            payload_format: self.payload_format,
        }
    }
}

fn check_range(key: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )))
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("mqtt_broker", &self.mqtt_broker)
            .field("mqtt_port", &self.mqtt_port)
            .field("mqtt_username", &self.mqtt_username)
            .field("mqtt_password", &"<redacted>")
            .field("mqtt_topic", &self.mqtt_topic)
            .field("mqtt_client_id", &self.mqtt_client_id)
            .field("mqtt_keep_alive_seconds", &self.mqtt_keep_alive_seconds)
            .field(
                "mqtt_connect_timeout_seconds",
                &self.mqtt_connect_timeout_seconds,
            )
            .field(
                "mqtt_reconnect_delay_seconds",
                &self.mqtt_reconnect_delay_seconds,
            )
            .field("read_interval_seconds", &self.read_interval_seconds)
            .field("sensor_root", &self.sensor_root)
            .field("sensor_pattern", &self.sensor_pattern)
            .field("sensor_id", &self.sensor_id)
            .field("payload_format", &self.payload_format)
            .finish()
    }
}
