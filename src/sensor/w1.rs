//! 1-Wire sensor backed by the kernel's sysfs readout file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thermowatch_types::Reading;

use super::{parse_readout, Sensor};
use crate::device::DeviceHandle;
use crate::error::SensorError;

/// A sensor that reads a DS18B20's `w1_slave` file.
///
/// Each call to [`Sensor::read`] reads the whole file. The kernel triggers a
/// fresh conversion on every read, so this can take most of a second.
#[derive(Debug)]
pub struct W1Sensor {
    handle: DeviceHandle,
    readout_path: PathBuf,
    description: String,
}

impl W1Sensor {
    /// Create a sensor for a located device.
    pub fn new(handle: DeviceHandle) -> Self {
        let readout_path = handle.readout_path();
        let description = format!("w1: {}", handle.id());
        Self {
            handle,
            readout_path,
            description,
        }
    }

    /// The device this sensor reads.
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// The file read on each cycle.
    pub fn readout_path(&self) -> &Path {
        &self.readout_path
    }
}

#[async_trait]
impl Sensor for W1Sensor {
    async fn read(&mut self) -> Result<Reading, SensorError> {
        let raw = tokio::fs::read(&self.readout_path)
            .await
            .map_err(|source| SensorError::Io {
                path: self.readout_path.clone(),
                source,
            })?;

        Ok(parse_readout(&raw)?)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use std::fs;

    fn device_with_readout(contents: &str) -> (tempfile::TempDir, W1Sensor) {
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join("28-0316a2795cff");
        fs::create_dir(&device).unwrap();
        fs::write(device.join("w1_slave"), contents).unwrap();
        let sensor = W1Sensor::new(DeviceHandle::new(&device));
        (dir, sensor)
    }

    #[test]
    fn test_w1_sensor_new() {
        let sensor = W1Sensor::new(DeviceHandle::new("/sys/bus/w1/devices/28-00000a1b2c3d"));
        assert_eq!(sensor.description(), "w1: 28-00000a1b2c3d");
        assert_eq!(
            sensor.readout_path(),
            Path::new("/sys/bus/w1/devices/28-00000a1b2c3d/w1_slave")
        );
    }

    #[tokio::test]
    async fn test_w1_sensor_reads_readout() {
        let (_dir, mut sensor) = device_with_readout(
            "4b 01 4b 46 7f ff 05 10 e1 : crc=e1 YES\n4b 01 4b 46 7f ff 05 10 e1 t=20687\n",
        );

        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.celsius(), 20.687);
    }

    #[tokio::test]
    async fn test_w1_sensor_not_ready() {
        let (_dir, mut sensor) = device_with_readout(
            "4b 01 4b 46 7f ff 05 10 e1 : crc=00 NO\n4b 01 4b 46 7f ff 05 10 e1 t=20687\n",
        );

        let err = sensor.read().await.unwrap_err();
        assert!(err.is_not_ready());
    }

    #[tokio::test]
    async fn test_w1_sensor_parse_anomaly() {
        let (_dir, mut sensor) = device_with_readout("crc=e1 YES\nt=oops\n");

        let err = sensor.read().await.unwrap_err();
        assert!(matches!(
            err,
            SensorError::Parse(ParseError::NumericParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_w1_sensor_unplugged() {
        let (dir, mut sensor) = device_with_readout("crc=e1 YES\nt=20687\n");
        fs::remove_dir_all(dir.path().join("28-0316a2795cff")).unwrap();

        let err = sensor.read().await.unwrap_err();
        assert!(matches!(err, SensorError::Io { .. }));
        assert!(!err.is_not_ready());
    }
}
