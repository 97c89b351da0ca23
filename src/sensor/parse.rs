//! Parser for the `w1_slave` readout format.
//!
//! The kernel driver exposes two lines per read:
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```
//!
//! The first line carries the CRC check result; `YES` means the conversion
//! completed. The second line carries the temperature in millidegrees Celsius.

use chrono::{DateTime, Utc};
use thermowatch_types::Reading;

use crate::error::ParseError;

/// Token on the first line marking a completed conversion.
pub const VALIDITY_MARKER: &str = "YES";

/// Prefix of the millidegree field on the second line.
pub const TEMPERATURE_FIELD: &str = "t=";

/// Parse a raw readout, stamping the reading with the current time.
pub fn parse_readout(raw: &[u8]) -> Result<Reading, ParseError> {
    parse_readout_at(raw, Utc::now())
}

/// Parse a raw readout captured at `captured_at`.
pub fn parse_readout_at(raw: &[u8], captured_at: DateTime<Utc>) -> Result<Reading, ParseError> {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.split('\n');

    let (Some(status), Some(data)) = (lines.next(), lines.next()) else {
        return Err(ParseError::MalformedFormat);
    };

    if !status.contains(VALIDITY_MARKER) {
        return Err(ParseError::ReadingNotReady);
    }

    let start = data
        .find(TEMPERATURE_FIELD)
        .ok_or(ParseError::FieldNotFound)?;
    let digits = data[start + TEMPERATURE_FIELD.len()..].trim();

    let millidegrees: i64 = digits
        .parse()
        .map_err(|_| ParseError::NumericParseError(digits.to_string()))?;

    Ok(Reading::from_millidegrees(millidegrees, captured_at))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_703_160_000, 0).unwrap()
    }

    fn readout(status: &str, millidegrees: &str) -> String {
        format!(
            "72 01 4b 46 7f ff 0e 10 57 : crc=57 {}\n72 01 4b 46 7f ff 0e 10 57 t={}\n",
            status, millidegrees
        )
    }

    #[test]
    fn test_parse_device_readout() {
        let raw = readout("YES", "23125");
        let reading = parse_readout_at(raw.as_bytes(), at()).unwrap();

        assert_eq!(reading.celsius(), 23.125);
        assert_eq!(reading.captured_at(), at());
    }

    #[test]
    fn test_parse_minimal_readout() {
        let reading = parse_readout_at(b"aa bb cc YES\nt=23562\n", at()).unwrap();
        assert_eq!(reading.celsius(), 23.562);
    }

    #[test]
    fn parsed_value_is_exact_quotient() {
        for n in [-55_000i64, -1_250, -1, 0, 1, 999, 1_000, 23_562, 85_000, 125_000] {
            let raw = readout("YES", &n.to_string());
            let reading = parse_readout_at(raw.as_bytes(), at()).unwrap();
            assert_eq!(reading.celsius(), n as f64 / 1000.0, "t={}", n);
        }
    }

    #[test]
    fn test_parse_not_ready() {
        let raw = readout("NO", "23125");
        assert_eq!(
            parse_readout_at(raw.as_bytes(), at()),
            Err(ParseError::ReadingNotReady)
        );
    }

    #[test]
    fn test_parse_non_numeric() {
        let raw = readout("YES", "abc");
        assert_eq!(
            parse_readout_at(raw.as_bytes(), at()),
            Err(ParseError::NumericParseError("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_empty_value() {
        assert_eq!(
            parse_readout_at(b"crc=57 YES\nt=\n", at()),
            Err(ParseError::NumericParseError(String::new()))
        );
    }

    #[test]
    fn test_parse_single_line() {
        assert_eq!(
            parse_readout_at(b"72 01 4b 46 7f ff 0e 10 57 : crc=57 YES", at()),
            Err(ParseError::MalformedFormat)
        );
        assert_eq!(parse_readout_at(b"", at()), Err(ParseError::MalformedFormat));
    }

    #[test]
    fn test_parse_missing_field() {
        assert_eq!(
            parse_readout_at(b"crc=57 YES\n72 01 4b 46 7f ff 0e 10 57\n", at()),
            Err(ParseError::FieldNotFound)
        );
        // A trailing newline alone yields an empty second line.
        assert_eq!(
            parse_readout_at(b"crc=57 YES\n", at()),
            Err(ParseError::FieldNotFound)
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let reading = parse_readout_at(b"crc=57 YES\nt=  21500 \r\n", at()).unwrap();
        assert_eq!(reading.celsius(), 21.5);
    }

    #[test]
    fn test_validity_checked_before_field() {
        // Not-ready wins even when the data line is also broken.
        assert_eq!(
            parse_readout_at(b"crc=00 NO\ngarbage\n", at()),
            Err(ParseError::ReadingNotReady)
        );
    }
}
