//! Publishing readings to the message bus.
//!
//! A [`Publish`] implementation owns a bus session and sends one message per
//! call. The production implementation is [`MqttPublisher`]; the payload
//! layout lives in [`payload`].
//!
//! # Session model
//!
//! ```text
//! ┌──────────────┐  try_publish   ┌───────────────┐   socket   ┌────────┐
//! │ MqttPublisher│───────────────▶│ driver task   │───────────▶│ broker │
//! │  (poll loop) │◀───────────────│ (EventLoop)   │◀───────────│        │
//! └──────────────┘ Sent/LinkLost  └───────┬───────┘            └────────┘
//!                                         │ watch<LinkState>
//!                                         ▼
//!                                  Up / Down / Connecting
//! ```
//!
//! The driver task keeps polling the transport, which reconnects on its own
//! after a link loss. Publishes made while the link is not up fail fast with
//! [`PublishError::NotConnected`](crate::error::PublishError::NotConnected).

mod mqtt;
pub mod payload;

pub use mqtt::{BrokerSettings, MqttPublisher, DISCONNECT_GRACE};
pub use payload::PayloadFormat;

use std::fmt::Debug;

use async_trait::async_trait;
use thermowatch_types::Reading;

use crate::error::PublishError;

/// Trait for sinks that accept temperature readings.
#[async_trait]
pub trait Publish: Send + Debug {
    /// Publish one reading.
    ///
    /// Resolves once the transport has handed the message to the link, or
    /// with an error if the link is unavailable or drops mid-send.
    async fn publish(&mut self, reading: &Reading) -> Result<(), PublishError>;

    /// Close the session, allowing a short grace period for in-flight sends.
    async fn disconnect(&mut self);

    /// Returns a human-readable description of the destination.
    fn description(&self) -> &str;
}

/// Connection state of a bus session, as observed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// A reconnect is in progress.
    Connecting,
    /// The broker has acknowledged the session.
    Up,
    /// The link is down, with the transport's reason.
    Down(String),
}

impl LinkState {
    /// Whether publishes can currently be sent.
    pub fn is_up(&self) -> bool {
        matches!(self, LinkState::Up)
    }
}
