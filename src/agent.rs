//! Process-level wiring: configuration in, running poll loop out.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::device;
use crate::error::AgentError;
use crate::poll::{PollLoop, ShutdownHandle};
use crate::publish::{MqttPublisher, Publish};
use crate::sensor::W1Sensor;

/// Run the agent until `shutdown` fires.
///
/// The sensor is located before the broker is contacted, so a host without a
/// sensor never opens a session. Both steps are fatal on failure. Once the
/// loop stops, the session is closed within the disconnect grace period.
pub async fn run(config: AgentConfig, shutdown: watch::Receiver<bool>) -> Result<(), AgentError> {
    config.validate()?;

    let handle = device::discover(
        &config.sensor_root,
        &config.sensor_pattern,
        config.sensor_id.as_deref(),
    )?;
    let sensor = W1Sensor::new(handle);

    let settings = config.broker_settings();
    let publisher = MqttPublisher::connect(&settings).await?;

    info!("Publishing to topic: {}", settings.topic);
    info!("Reading interval: {:?}", config.read_interval());

    let mut poll = PollLoop::new(sensor, publisher, config.read_interval());
    poll.run(shutdown).await;

    info!("Shutting down...");
    poll.publisher_mut().disconnect().await;
    Ok(())
}

/// Turn SIGINT and SIGTERM into a shutdown request.
///
/// The returned receiver is meant for [`run`]. Must be called from within a
/// tokio runtime.
pub fn install_signal_handlers() -> Result<watch::Receiver<bool>, AgentError> {
    let (handle, shutdown) = ShutdownHandle::new();

    #[cfg(unix)]
    let mut terminate = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).map_err(AgentError::Signal)?
    };

    tokio::spawn(async move {
        #[cfg(unix)]
        let terminated = terminate.recv();
        #[cfg(not(unix))]
        let terminated = std::future::pending::<Option<()>>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Failed to listen for interrupt: {}", e);
                }
                info!("Received interrupt");
            }
            _ = terminated => info!("Received terminate signal"),
        }
        handle.stop();
    });

    Ok(shutdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    use tokio::net::TcpListener;

    use crate::publish::PayloadFormat;
    use crate::testing::{accept_session, read_publish};

    fn config(sensor_root: &Path, port: u16) -> AgentConfig {
        AgentConfig {
            mqtt_broker: "127.0.0.1".to_string(),
            mqtt_port: port,
            mqtt_username: String::new(),
            mqtt_password: String::new(),
            mqtt_topic: "sensors/temperature".to_string(),
            mqtt_client_id: "thermowatch-test".to_string(),
            mqtt_keep_alive_seconds: 30,
            mqtt_connect_timeout_seconds: 5,
            mqtt_reconnect_delay_seconds: 60,
            read_interval_seconds: 1,
            sensor_root: sensor_root.to_path_buf(),
            sensor_pattern: "28-*".to_string(),
            sensor_id: None,
            payload_format: PayloadFormat::Legacy,
        }
    }

    #[tokio::test]
    async fn missing_sensor_fails_before_connecting() {
        let root = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (_handle, shutdown) = ShutdownHandle::new();
        let err = run(config(root.path(), port), shutdown).await.unwrap_err();
        assert!(matches!(err, AgentError::Locate(_)));
        assert!(err
            .to_string()
            .starts_with("failed to initialize temperature sensor"));

        let accepted =
            tokio::time::timeout(Duration::from_millis(200), listener.accept()).await;
        assert!(accepted.is_err(), "agent contacted the broker");
    }

    #[tokio::test]
    async fn unreachable_broker_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("28-0316a2795cff")).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (_handle, shutdown) = ShutdownHandle::new();
        let err = run(config(root.path(), port), shutdown).await.unwrap_err();
        assert!(matches!(err, AgentError::Connect(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let root = tempfile::tempdir().unwrap();
        let mut cfg = config(root.path(), 1883);
        cfg.read_interval_seconds = 0;

        let (_handle, shutdown) = ShutdownHandle::new();
        let err = run(cfg, shutdown).await.unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[tokio::test]
    async fn oversized_interval_fails_cleanly() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("28-0316a2795cff")).unwrap();
        let mut cfg = config(root.path(), 1883);
        cfg.read_interval_seconds = u64::MAX;

        let (_handle, shutdown) = ShutdownHandle::new();
        let err = run(cfg, shutdown).await.unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[tokio::test]
    async fn test_reads_and_publishes_until_stopped() {
        let root = tempfile::tempdir().unwrap();
        let device = root.path().join("28-0316a2795cff");
        std::fs::create_dir(&device).unwrap();
        std::fs::write(
            device.join("w1_slave"),
            "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23562\n",
        )
        .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let broker = tokio::spawn(async move {
            let mut stream = accept_session(&listener).await;
            read_publish(&mut stream).await
        });

        let (handle, shutdown) = ShutdownHandle::new();
        let agent = tokio::spawn(run(config(root.path(), port), shutdown));

        let (topic, payload) = tokio::time::timeout(Duration::from_secs(10), broker)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(topic, "sensors/temperature");
        assert!(
            payload.starts_with(
                r#"{"temperature": 23.56, "fahrenheit": 74.41F, "unit": "C", "timestamp": ""#
            ),
            "unexpected payload: {}",
            payload
        );

        handle.stop();
        tokio::time::timeout(Duration::from_secs(5), agent)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
