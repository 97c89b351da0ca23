//! # thermowatch-types
//!
//! Core types for temperature telemetry. This crate defines the values that
//! flow through the thermowatch pipeline: a [`Reading`] captured from a sensor
//! and the [`TemperatureMessage`] published for it on the message bus.
//!
//! ## Features
//!
//! - `std` (default): Clock access for "now" constructors
//! - `serde`: Serialization of readings and messages via serde
//!
//! ## Example
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//! use thermowatch_types::{Reading, TemperatureMessage};
//!
//! let captured_at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
//! let reading = Reading::from_millidegrees(23_562, captured_at);
//!
//! assert_eq!(reading.celsius(), 23.562);
//! assert_eq!(reading.whole_degrees(), 23);
//!
//! let message = TemperatureMessage::from_reading(&reading, captured_at.fixed_offset());
//! assert_eq!(message.unit.as_str(), "C");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

mod message;
mod reading;

pub use message::*;
pub use reading::*;
