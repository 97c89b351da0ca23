//! MQTT publisher built on rumqttc.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use thermowatch_types::{Reading, TemperatureMessage};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::payload::{self, PayloadFormat};
use super::{LinkState, Publish};
use crate::error::{ConnectError, PublishError};

/// How long [`MqttPublisher::disconnect`] waits for in-flight sends to flush.
pub const DISCONNECT_GRACE: Duration = Duration::from_millis(250);

/// Capacity of the client's request queue.
const REQUEST_CAPACITY: usize = 10;

/// Capacity of the send-confirmation channel from the driver task.
const DELIVERY_CAPACITY: usize = 16;

/// Broker endpoint, credentials and session options.
#[derive(Clone)]
pub struct BrokerSettings {
    /// Broker host name or address.
    pub host: String,
    /// Broker TCP port.
    pub port: u16,
    /// Empty means no credentials are sent.
    pub username: String,
    /// Ignored when `username` is empty.
    pub password: String,
    /// MQTT client identifier presented on connect.
    pub client_id: String,
    /// Topic every reading is published to.
    pub topic: String,
    /// Keep-alive interval negotiated with the broker.
    pub keep_alive: Duration,
    /// Upper bound on the initial connect, including the broker's ack.
    pub connect_timeout: Duration,
    /// Pause between reconnect attempts after the link drops.
    pub reconnect_delay: Duration,
    /// Layout of the published payload.
    pub payload_format: PayloadFormat,
}

impl BrokerSettings {
    /// The broker address in `tcp://host:port` form.
    pub fn endpoint(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options
            .set_keep_alive(self.keep_alive)
            .set_clean_session(true);
        if !self.username.is_empty() {
            options.set_credentials(&self.username, &self.password);
        }
        options
    }
}

impl fmt::Debug for BrokerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("topic", &self.topic)
            .field("keep_alive", &self.keep_alive)
            .field("connect_timeout", &self.connect_timeout)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("payload_format", &self.payload_format)
            .finish()
    }
}

/// Outcome of a send, reported by the driver task.
#[derive(Debug)]
enum Delivery {
    Sent,
    LinkLost(String),
}

/// A publisher holding one MQTT session.
///
/// Messages go out at QoS 0 (at most once) without the retain flag. The
/// session's event loop runs on a background task that reconnects on its own
/// after a link loss; while it does, publishes fail with
/// [`PublishError::NotConnected`].
///
/// A publish waits for the transport to write the message to the link, and
/// fails with [`PublishError::LinkLost`] if the link leaves the `Up` state
/// first. There is no timeout beyond that; a link that stalls without
/// erroring stalls the publish with it.
///
/// A message queued just before the link dropped is kept by the transport and
/// sent once the session is re-established, even though its publish already
/// reported [`PublishError::LinkLost`]. It then arrives late, carrying its
/// original timestamp, and the next cycle may send the same reading again.
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
    format: PayloadFormat,
    link: watch::Receiver<LinkState>,
    deliveries: mpsc::Receiver<Delivery>,
    driver: Option<JoinHandle<()>>,
    description: String,
}

impl MqttPublisher {
    /// Connect to the broker and wait for it to acknowledge the session.
    ///
    /// Fails if the broker refuses the connection, the transport errors, or no
    /// acknowledgment arrives within `settings.connect_timeout`.
    pub async fn connect(settings: &BrokerSettings) -> Result<Self, ConnectError> {
        let endpoint = settings.endpoint();
        let (client, mut eventloop) = AsyncClient::new(settings.mqtt_options(), REQUEST_CAPACITY);

        match tokio::time::timeout(settings.connect_timeout, await_connack(&mut eventloop)).await {
            Ok(Ok(())) => info!("Connected to MQTT broker at {}", endpoint),
            Ok(Err(e)) => {
                return Err(ConnectError::Transport {
                    endpoint,
                    reason: e.to_string(),
                })
            }
            Err(_) => return Err(ConnectError::Timeout(endpoint)),
        }

        let (link_tx, link_rx) = watch::channel(LinkState::Up);
        let (delivery_tx, delivery_rx) = mpsc::channel(DELIVERY_CAPACITY);
        let driver = tokio::spawn(drive(
            eventloop,
            link_tx,
            delivery_tx,
            settings.reconnect_delay,
        ));

        Ok(Self {
            client,
            topic: settings.topic.clone(),
            format: settings.payload_format,
            link: link_rx,
            deliveries: delivery_rx,
            driver: Some(driver),
            description: format!("mqtt: {}/{}", endpoint, settings.topic),
        })
    }

    /// Current link state.
    pub fn link_state(&self) -> LinkState {
        self.link.borrow().clone()
    }

    /// Watch the link state as the transport reports changes.
    pub fn watch_link(&self) -> watch::Receiver<LinkState> {
        self.link.clone()
    }

    /// The topic messages are published to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl Publish for MqttPublisher {
    async fn publish(&mut self, reading: &Reading) -> Result<(), PublishError> {
        if self.driver.is_none() {
            return Err(PublishError::Closed);
        }

        let message = TemperatureMessage::now(reading);
        let body = payload::encode(&message, self.format)?;

        // Confirmations left over from earlier sends that already failed.
        while self.deliveries.try_recv().is_ok() {}

        let state = self.link.borrow_and_update().clone();
        match state {
            LinkState::Up => {}
            LinkState::Connecting => {
                return Err(PublishError::NotConnected("reconnect in progress".to_string()))
            }
            LinkState::Down(reason) => return Err(PublishError::NotConnected(reason)),
        }

        self.client
            .try_publish(self.topic.as_str(), QoS::AtMostOnce, false, body)
            .map_err(|e| PublishError::Client(e.to_string()))?;

        await_delivery(&mut self.deliveries, &mut self.link).await?;
        info!(
            "Published temperature: {:.2}°C, fahrenheit: {:.2}F",
            message.temperature, message.fahrenheit
        );
        Ok(())
    }

    async fn disconnect(&mut self) {
        let Some(mut driver) = self.driver.take() else {
            return;
        };

        if let Err(e) = self.client.try_disconnect() {
            debug!("MQTT disconnect request not queued: {}", e);
        }

        match tokio::time::timeout(DISCONNECT_GRACE, &mut driver).await {
            Ok(_) => info!("Disconnected from MQTT broker"),
            Err(_) => {
                warn!(
                    "MQTT disconnect did not complete within {:?}, closing link",
                    DISCONNECT_GRACE
                );
                driver.abort();
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for MqttPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttPublisher")
            .field("topic", &self.topic)
            .field("format", &self.format)
            .field("link", &*self.link.borrow())
            .finish()
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

/// Wait for the driver to confirm the send queued last.
///
/// Resolves with an error as soon as the link is seen leaving `Up`, whether or
/// not a matching [`Delivery::LinkLost`] arrives. The caller must have marked
/// the current link state as seen before queueing the send.
async fn await_delivery(
    deliveries: &mut mpsc::Receiver<Delivery>,
    link: &mut watch::Receiver<LinkState>,
) -> Result<(), PublishError> {
    loop {
        tokio::select! {
            delivery = deliveries.recv() => {
                return match delivery {
                    Some(Delivery::Sent) => Ok(()),
                    Some(Delivery::LinkLost(reason)) => Err(PublishError::LinkLost(reason)),
                    None => Err(PublishError::Closed),
                };
            }
            changed = link.changed() => {
                if changed.is_err() {
                    return Err(PublishError::Closed);
                }
                let state = link.borrow_and_update().clone();
                match state {
                    LinkState::Up => {}
                    LinkState::Down(reason) => return Err(PublishError::LinkLost(reason)),
                    LinkState::Connecting => {
                        return Err(PublishError::LinkLost("reconnect in progress".to_string()))
                    }
                }
            }
        }
    }
}

async fn await_connack(eventloop: &mut EventLoop) -> Result<(), ConnectionError> {
    loop {
        if let Event::Incoming(Packet::ConnAck(_)) = eventloop.poll().await? {
            return Ok(());
        }
    }
}

/// Drive the session's event loop until it is disconnected or abandoned.
///
/// Polling again after an error makes rumqttc reconnect, so the loop only
/// needs to pace the attempts.
async fn drive(
    mut eventloop: EventLoop,
    link: watch::Sender<LinkState>,
    deliveries: mpsc::Sender<Delivery>,
    reconnect_delay: Duration,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Reconnected to MQTT broker");
                link.send_replace(LinkState::Up);
            }
            Ok(Event::Outgoing(Outgoing::Publish(_))) => {
                let _ = deliveries.try_send(Delivery::Sent);
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                link.send_replace(LinkState::Down("disconnected".to_string()));
                break;
            }
            Ok(_) => {}
            Err(ConnectionError::RequestsDone) => {
                debug!("MQTT client dropped, stopping event loop");
                break;
            }
            Err(e) => {
                let reason = e.to_string();
                let previous = link.send_replace(LinkState::Down(reason.clone()));
                if previous.is_up() {
                    warn!("MQTT connection lost: {}", reason);
                    let _ = deliveries.try_send(Delivery::LinkLost(reason));
                } else {
                    debug!("MQTT reconnect attempt failed: {}", reason);
                }

                tokio::time::sleep(reconnect_delay).await;
                link.send_replace(LinkState::Connecting);
            }
        }
    }
}
