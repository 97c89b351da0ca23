//! Sensor device discovery.
//!
//! 1-Wire temperature sensors appear under the kernel's device namespace as
//! directories named `<family>-<serial>` (family `28` for DS18B20). Each one
//! exposes its readout in a `w1_slave` file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::LocateError;

/// Default device namespace root for 1-Wire sensors.
pub const DEFAULT_ROOT: &str = "/sys/bus/w1/devices";

/// Default pattern matching DS18B20 devices.
pub const DEFAULT_PATTERN: &str = "28-*";

/// File within a device directory that holds the raw readout.
pub const READOUT_FILE: &str = "w1_slave";

/// Scan `root` for entries matching the glob `pattern`.
///
/// Returns every match in a deterministic (lexicographic) order. An empty
/// result is reported as [`LocateError::NotFound`]. The scan is read-only.
pub fn locate(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, LocateError> {
    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let full_pattern = format!("{}/{}", escaped_root.trim_end_matches('/'), pattern);

    let entries = glob::glob(&full_pattern).map_err(|e| LocateError::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => candidates.push(path),
            Err(e) => debug!("Skipping unreadable device entry: {}", e),
        }
    }

    if candidates.is_empty() {
        return Err(LocateError::NotFound {
            root: root.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    Ok(candidates)
}

/// Pick one device from the candidates returned by [`locate`].
///
/// With no `sensor_id`, the first candidate wins. Otherwise the candidate
/// whose final path component equals `sensor_id` is chosen.
pub fn select(
    candidates: &[PathBuf],
    sensor_id: Option<&str>,
) -> Result<DeviceHandle, LocateError> {
    let chosen = match sensor_id {
        Some(id) => candidates
            .iter()
            .find(|path| path.file_name().is_some_and(|name| name == id))
            .ok_or_else(|| LocateError::UnknownSensor(id.to_string()))?,
        None => candidates.first().ok_or(LocateError::NoCandidates)?,
    };

    Ok(DeviceHandle::new(chosen))
}

/// Locate and select the sensor this process will read for its lifetime.
pub fn discover(
    root: &Path,
    pattern: &str,
    sensor_id: Option<&str>,
) -> Result<DeviceHandle, LocateError> {
    let candidates = locate(root, pattern)?;
    if candidates.len() > 1 {
        debug!(
            "{} sensors match {:?}; only one will be read",
            candidates.len(),
            pattern
        );
    }

    let handle = select(&candidates, sensor_id)?;
    info!("Found DS18B20 sensor: {}", handle.path().display());
    Ok(handle)
}

/// A located sensor device.
///
/// Created once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    path: PathBuf,
}

impl DeviceHandle {
    /// Wrap a device directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The device directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The device identifier, e.g. `28-0316a2795cff`.
    pub fn id(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// Path of the file holding the raw readout.
    pub fn readout_path(&self) -> PathBuf {
        self.path.join(READOUT_FILE)
    }
}
