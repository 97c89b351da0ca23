//! Sensor abstraction for producing temperature readings.
//!
//! A [`Sensor`] performs one read-and-parse cycle on demand. The production
//! implementation is [`W1Sensor`], which reads a 1-Wire device's readout file
//! and hands the bytes to [`parse_readout`].

mod parse;
mod w1;

pub use parse::{parse_readout, parse_readout_at, TEMPERATURE_FIELD, VALIDITY_MARKER};
pub use w1::W1Sensor;

use std::fmt::Debug;

use async_trait::async_trait;
use thermowatch_types::Reading;

use crate::error::SensorError;

/// Trait for anything that can be polled for a temperature reading.
///
/// Implementations must not retry internally: a failed read is reported to
/// the caller, which decides whether to try again on its next cycle.
#[async_trait]
pub trait Sensor: Send + Debug {
    /// Read the sensor once.
    ///
    /// [`SensorError::is_not_ready`] distinguishes the expected "conversion
    /// not complete" case from genuine failures.
    async fn read(&mut self) -> Result<Reading, SensorError>;

    /// Returns a human-readable description of the sensor.
    fn description(&self) -> &str;
}
