//! # thermowatch
//!
//! An edge telemetry agent that reads a DS18B20 1-Wire temperature sensor on a
//! fixed cadence and publishes changed readings to an MQTT broker.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              agent                               │
//! │  ┌─────────┐   ┌─────────┐   ┌─────────────────────────────────┐ │
//! │  │ config  │──▶│ device  │──▶│              poll               │ │
//! │  │ (env,   │   │(discover│   │  ┌────────┐ ┌────────┐ ┌─────┐  │ │
//! │  │  file)  │   │ sensor) │   │  │ sensor │▶│ filter │▶│pub- │──┼─┼─▶ broker
//! │  └─────────┘   └─────────┘   │  │ (read) │ │(change)│ │lish │  │ │
//! │                              │  └────────┘ └────────┘ └─────┘  │ │
//! │                              └─────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`device`]**: Finds sensor devices under the 1-Wire namespace and picks one
//! - **[`sensor`]**: The [`Sensor`] trait and [`W1Sensor`], which reads and parses
//!   a device's readout file
//! - **[`filter`]**: [`ChangeFilter`], which suppresses readings whose whole-degree
//!   value has not changed since the last publish
//! - **[`publish`]**: The [`Publish`] trait and [`MqttPublisher`]
//! - **[`poll`]**: [`PollLoop`], which ties the three together on a fixed interval
//! - **[`agent`]**: Startup order, signal handling and shutdown
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Defaults: broker on localhost:1883, read every 30 seconds
//! thermowatch
//!
//! # Environment overrides
//! MQTT_BROKER=broker.local READ_INTERVAL_SECONDS=60 thermowatch --verbose
//! ```
//!
//! ### Parsing a readout
//!
//! ```
//! use thermowatch::sensor::parse_readout;
//!
//! let raw = b"72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n";
//! let reading = parse_readout(raw).unwrap();
//! assert_eq!(reading.celsius(), 23.125);
//! ```
//!
//! ### Driving a loop with a custom sensor
//!
//! ```no_run
//! use std::time::Duration;
//! use thermowatch::{AgentConfig, MqttPublisher, PollLoop, ShutdownHandle, W1Sensor};
//! use thermowatch::device::DeviceHandle;
//!
//! # tokio_test::block_on(async {
//! let config = AgentConfig::load(None).unwrap();
//! let sensor = W1Sensor::new(DeviceHandle::new("/sys/bus/w1/devices/28-0316a2795cff"));
//! let publisher = MqttPublisher::connect(&config.broker_settings()).await.unwrap();
//!
//! let (handle, shutdown) = ShutdownHandle::new();
//! let mut poll = PollLoop::new(sensor, publisher, Duration::from_secs(30));
//! poll.run(shutdown).await;
//! # drop(handle);
//! # });
//! ```

pub mod agent;
pub mod config;
pub mod device;
pub mod error;
pub mod filter;
pub mod poll;
pub mod publish;
pub mod sensor;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use config::AgentConfig;
pub use device::DeviceHandle;
pub use error::{
    AgentError, ConfigError, ConnectError, LocateError, ParseError, PublishError, SensorError,
};
pub use filter::ChangeFilter;
pub use poll::{CycleOutcome, PollLoop, ShutdownHandle};
pub use publish::{BrokerSettings, LinkState, MqttPublisher, PayloadFormat, Publish};
pub use sensor::{Sensor, W1Sensor};
pub use thermowatch_types::{Reading, TemperatureMessage, TemperatureUnit};
