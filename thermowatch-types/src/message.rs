//! The message published to the bus for each accepted reading.

use chrono::{DateTime, FixedOffset};

use crate::Reading;

/// Unit label carried in published messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TemperatureUnit {
    /// Degrees Celsius, serialized as `"C"`.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "C"))]
    Celsius,
}

impl TemperatureUnit {
    /// The wire label for this unit.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "C",
        }
    }
}

impl core::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A temperature record as published to the message bus.
///
/// The timestamp is the time of publication, not the time the reading was
/// captured.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemperatureMessage {
    /// Temperature in degrees Celsius.
    pub temperature: f64,

    /// Temperature in degrees Fahrenheit.
    pub fahrenheit: f64,

    /// Unit of `temperature`.
    pub unit: TemperatureUnit,

    /// Publication time, with the publisher's local offset.
    pub timestamp: DateTime<FixedOffset>,
}

impl TemperatureMessage {
    /// Build the message for `reading`, published at `published_at`.
    pub fn from_reading(reading: &Reading, published_at: DateTime<FixedOffset>) -> Self {
        Self {
            temperature: reading.celsius(),
            fahrenheit: reading.fahrenheit(),
            unit: TemperatureUnit::Celsius,
            timestamp: published_at,
        }
    }

    /// Build the message for `reading`, stamped with the local time now.
    #[cfg(feature = "std")]
    pub fn now(reading: &Reading) -> Self {
        Self::from_reading(reading, chrono::Local::now().into())
    }
}
