//! The poll loop: read, filter, publish on a fixed cadence.
//!
//! The loop alternates between two states. While idle it waits for the next
//! tick or a shutdown request. On a tick it runs one cycle:
//!
//! ```text
//! tick ─▶ Sensor::read ─▶ ChangeFilter::should_publish ─▶ Publish::publish
//!              │                     │                          │
//!         not ready / error      unchanged              ok: record_published
//!              └─────────────────────┴──────────── back to idle ┘
//! ```
//!
//! Cycles never overlap. The first tick fires one interval after the loop
//! starts; later ticks follow a fixed grid, and a cycle that overruns its
//! slot delays the grid instead of triggering catch-up cycles.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::filter::ChangeFilter;
use crate::publish::Publish;
use crate::sensor::Sensor;

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// A reading was published (Celsius).
    Published(f64),
    /// A reading was taken but its whole-degree value had not changed.
    Suppressed(f64),
    /// The sensor had not finished its conversion.
    NotReady,
    /// The sensor could not be read or its readout did not parse.
    ReadFailed,
    /// The publish attempt failed; the reading will be retried next cycle.
    PublishFailed,
}

/// Handle for requesting a shutdown of a running [`PollLoop`].
///
/// Dropping the handle also stops the loop.
#[derive(Debug)]
pub struct ShutdownHandle {
    stop_tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Create a handle and the receiver to pass to [`PollLoop::run`].
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (stop_tx, stop_rx) = watch::channel(false);
        (Self { stop_tx }, stop_rx)
    }

    /// Request shutdown.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Orchestrates one sensor and one publisher on a fixed cadence.
///
/// The loop is the only owner of the [`ChangeFilter`], so published state is
/// never shared with anything else.
#[derive(Debug)]
pub struct PollLoop<S, P> {
    sensor: S,
    publisher: P,
    filter: ChangeFilter,
    interval: Duration,
}

impl<S: Sensor, P: Publish> PollLoop<S, P> {
    /// Create a loop that reads `sensor` every `interval`.
    ///
    /// `interval` must be non-zero, and small enough that adding it to the
    /// current instant does not overflow; [`AgentConfig`](crate::AgentConfig)
    /// validation caps it at a day.
    pub fn new(sensor: S, publisher: P, interval: Duration) -> Self {
        Self {
            sensor,
            publisher,
            filter: ChangeFilter::new(),
            interval,
        }
    }

    /// The interval between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The change filter's current state.
    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    /// The sensor read on each cycle.
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// The publisher readings are sent to.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Mutable access to the publisher, e.g. to disconnect after [`run`](Self::run).
    pub fn publisher_mut(&mut self) -> &mut P {
        &mut self.publisher
    }

    /// Run one read-filter-publish cycle.
    ///
    /// Every failure is logged here and reported in the outcome; none of them
    /// ends the loop.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let reading = match self.sensor.read().await {
            Ok(reading) => reading,
            Err(e) if e.is_not_ready() => {
                debug!("Sensor reading not ready, retrying next cycle");
                return CycleOutcome::NotReady;
            }
            Err(e) => {
                warn!("Error reading temperature: {}", e);
                return CycleOutcome::ReadFailed;
            }
        };

        let celsius = reading.celsius();
        debug!(
            "Read temperature: {:.2}°C, fahrenheit: {:.2}F",
            celsius,
            reading.fahrenheit()
        );

        if !self.filter.should_publish(&reading) {
            debug!(
                "Temperature unchanged at {}°C, skipping publish",
                reading.whole_degrees()
            );
            return CycleOutcome::Suppressed(celsius);
        }

        match self.publisher.publish(&reading).await {
            Ok(()) => {
                self.filter.record_published(&reading);
                CycleOutcome::Published(celsius)
            }
            Err(e) => {
                error!("Error publishing temperature: {}", e);
                CycleOutcome::PublishFailed
            }
        }
    }

    /// Run cycles until `shutdown` turns true or its sender is dropped.
    ///
    /// A cycle in progress when shutdown is requested is abandoned; if it was
    /// mid-publish, the filter is left untouched.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Reading {} every {:?}, publishing to {}",
            self.sensor.description(),
            self.interval,
            self.publisher.description()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        outcome = self.run_cycle() => debug!("Cycle finished: {:?}", outcome),
                        _ = stop_requested(&mut shutdown) => {
                            info!("Shutdown requested, abandoning in-flight cycle");
                            break;
                        }
                    }
                }
                _ = stop_requested(&mut shutdown) => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }
    }
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender counts as a stop request.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
