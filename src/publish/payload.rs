//! Payload encoding for published temperature messages.
//!
//! Two layouts are supported:
//!
//! - [`PayloadFormat::Legacy`] (default) is byte-compatible with the agent's
//!   deployed consumers. Its `fahrenheit` value carries a trailing `F`, so the
//!   payload is not valid JSON:
//!
//!   ```text
//!   {"temperature": 23.56, "fahrenheit": 74.41F, "unit": "C", "timestamp": "2024-03-01T13:00:30+01:00"}
//!   ```
//!
//! - [`PayloadFormat::Json`] emits the same keys as strict JSON, with
//!   `fahrenheit` as a plain number.

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use thermowatch_types::{TemperatureMessage, TemperatureUnit};

/// Layout of the published payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Deployed layout with an `F`-suffixed Fahrenheit token.
    #[default]
    Legacy,
    /// Strictly valid JSON.
    Json,
}

#[derive(Serialize)]
struct JsonPayload {
    temperature: f64,
    fahrenheit: f64,
    unit: TemperatureUnit,
    timestamp: String,
}

/// Encode `message` in the given layout.
///
/// Temperatures are rendered with two decimal places; the timestamp is
/// RFC 3339 with second precision.
pub fn encode(
    message: &TemperatureMessage,
    format: PayloadFormat,
) -> Result<Vec<u8>, serde_json::Error> {
    match format {
        PayloadFormat::Legacy => Ok(format!(
            r#"{{"temperature": {:.2}, "fahrenheit": {:.2}F, "unit": "{}", "timestamp": "{}"}}"#,
            message.temperature,
            message.fahrenheit,
            message.unit,
            rfc3339(&message.timestamp)
        )
        .into_bytes()),
        PayloadFormat::Json => serde_json::to_vec(&JsonPayload {
            temperature: round2(message.temperature),
            fahrenheit: round2(message.fahrenheit),
            unit: message.unit,
            timestamp: rfc3339(&message.timestamp),
        }),
    }
}

fn rfc3339(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
