//! Error types for the sensor-to-publish pipeline.
//!
//! Every stage surfaces a classified failure to its caller. Only the poll loop
//! decides whether a failure is logged and skipped or ends the process.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from discovering sensor devices.
#[derive(Debug, Error)]
pub enum LocateError {
    /// No entry under the namespace root matched the pattern.
    #[error("no sensors matching {pattern:?} found under {}", root.display())]
    NotFound { root: PathBuf, pattern: String },

    /// The glob pattern could not be compiled.
    #[error("invalid device pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    /// Selection was attempted on an empty candidate list.
    #[error("no candidate devices to select from")]
    NoCandidates,

    /// A specific sensor id was requested but is not among the candidates.
    #[error("sensor {0:?} not found among discovered devices")]
    UnknownSensor(String),
}

/// Classified failures from parsing a raw sensor readout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Fewer than two lines in the readout.
    #[error("invalid sensor data format")]
    MalformedFormat,

    /// The first line lacks the validity marker; the conversion has not completed.
    #[error("sensor reading not ready")]
    ReadingNotReady,

    /// The second line lacks the `t=` field.
    #[error("temperature value not found")]
    FieldNotFound,

    /// The `t=` field is not a base-10 integer.
    #[error("error parsing temperature {0:?}")]
    NumericParseError(String),
}

impl ParseError {
    /// Whether the sensor simply needs another cycle to produce a value.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ParseError::ReadingNotReady)
    }
}

/// Errors from a single read-and-parse cycle.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The device's readout could not be read (unplugged, permissions, ...).
    #[error("error reading sensor data from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The readout was read but did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SensorError {
    /// True for the expected "conversion not complete" condition.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, SensorError::Parse(e) if e.is_retryable())
    }
}

/// Errors establishing the bus session. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The transport failed before the broker acknowledged the connection.
    #[error("failed to connect to MQTT broker at {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The broker did not acknowledge within the connect timeout.
    #[error("timed out connecting to MQTT broker at {0}")]
    Timeout(String),
}

/// Errors from a single publish attempt.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The link is down or reconnecting.
    #[error("not connected to MQTT broker: {0}")]
    NotConnected(String),

    /// The client rejected the request.
    #[error("failed to publish temperature: {0}")]
    Client(String),

    /// The link dropped while the publish was in flight.
    #[error("MQTT connection lost during publish: {0}")]
    LinkLost(String),

    /// The session has been shut down.
    #[error("MQTT session closed")]
    Closed,

    /// The payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or a value could not be converted.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Startup-fatal errors. Any of these ends the process with a non-zero status.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize temperature sensor: {0}")]
    Locate(#[from] LocateError),

    #[error("failed to initialize MQTT client: {0}")]
    Connect(#[from] ConnectError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}
