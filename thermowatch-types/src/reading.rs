//! Reading - a single validated temperature sample.

use chrono::{DateTime, Utc};

/// Number of raw readout units per degree Celsius.
pub const MILLIDEGREES_PER_DEGREE: f64 = 1000.0;

/// A validated temperature sample taken from a sensor.
///
/// Readings are immutable once constructed. The value is kept as the exact
/// quotient of the raw millidegree count, so `Reading::from_millidegrees(n, t)`
/// always reports `n as f64 / 1000.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    celsius: f64,
    captured_at: DateTime<Utc>,
}

impl Reading {
    /// Create a reading from a Celsius value.
    pub const fn new(celsius: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            celsius,
            captured_at,
        }
    }

    /// Create a reading from the sensor's raw millidegree count.
    pub fn from_millidegrees(millidegrees: i64, captured_at: DateTime<Utc>) -> Self {
        Self::new(millidegrees as f64 / MILLIDEGREES_PER_DEGREE, captured_at)
    }

    /// Create a reading stamped with the current time.
    #[cfg(feature = "std")]
    pub fn now(celsius: f64) -> Self {
        Self::new(celsius, Utc::now())
    }

    /// Temperature in degrees Celsius.
    pub fn celsius(&self) -> f64 {
        self.celsius
    }

    /// Temperature in degrees Fahrenheit (`C * 9/5 + 32`).
    pub fn fahrenheit(&self) -> f64 {
        self.celsius * 1.8 + 32.0
    }

    /// When the sample was taken.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Celsius value truncated toward zero.
    ///
    /// `20.9` and `20.1` both map to `20`; `-0.7` maps to `0`. Out-of-range
    /// values saturate at the `i64` bounds.
    pub fn whole_degrees(&self) -> i64 {
        self.celsius as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_703_160_000, 0).unwrap()
    }

    #[test]
    fn test_from_millidegrees() {
        let reading = Reading::from_millidegrees(23_562, at());
        assert_eq!(reading.celsius(), 23.562);
        assert_eq!(reading.captured_at(), at());
    }

    #[test]
    fn test_negative_millidegrees() {
        let reading = Reading::from_millidegrees(-10_125, at());
        assert_eq!(reading.celsius(), -10.125);
    }

    #[test]
    fn test_fahrenheit() {
        let reading = Reading::new(100.0, at());
        assert!((reading.fahrenheit() - 212.0).abs() < 1e-9);

        let reading = Reading::new(-40.0, at());
        assert!((reading.fahrenheit() + 40.0).abs() < 1e-9);
    }

    #[test]
    fn whole_degrees_truncates_toward_zero() {
        assert_eq!(Reading::new(20.9, at()).whole_degrees(), 20);
        assert_eq!(Reading::new(20.1, at()).whole_degrees(), 20);
        assert_eq!(Reading::new(21.0, at()).whole_degrees(), 21);
        assert_eq!(Reading::new(-0.7, at()).whole_degrees(), 0);
        assert_eq!(Reading::new(-1.7, at()).whole_degrees(), -1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let reading = Reading::from_millidegrees(19_750, at());
        let json = serde_json::to_string(&reading).unwrap();
        let parsed: Reading = serde_json::from_str(&json).unwrap();
        assert_eq!(reading, parsed);
    }
}
