//! Shared parsing helpers for ride exports.
//!
//! Timestamp and coordinate parsing for the loosely typed columns found in
//! CSV ride exports.

use chrono::NaiveDateTime;

/// Timestamp layouts seen in ride exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

/// Parses a ride timestamp. Returns `None` if no known layout matches.
#[must_use]
pub fn parse_ride_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Parses a single coordinate. Returns `None` if missing, blank,
/// unparseable, or not finite (`nan`, `inf`).
#[must_use]
pub fn parse_coordinate(s: Option<&str>) -> Option<f64> {
    let value = s?.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_separated_datetime() {
        let dt = parse_ride_datetime("2025-05-10 14:00:00").unwrap();
        assert_eq!(dt.to_string(), "2025-05-10 14:00:00");
    }

    #[test]
    fn parses_iso_datetime_with_fractional() {
        let dt = parse_ride_datetime("2025-05-10T14:00:00.250").unwrap();
        assert_eq!(dt.format("%H:%M:%S").to_string(), "14:00:00");
    }

    #[test]
    fn parses_minute_precision_and_us_dates() {
        assert!(parse_ride_datetime("2025-05-10 14:00").is_some());
        let dt = parse_ride_datetime("05/10/2025 09:15").unwrap();
        assert_eq!(dt.to_string(), "2025-05-10 09:15:00");
    }

    #[test]
    fn rejects_invalid_datetime() {
        assert!(parse_ride_datetime("not-a-date").is_none());
        assert!(parse_ride_datetime("").is_none());
    }

    #[test]
    fn parses_coordinates() {
        let lat = parse_coordinate(Some(" 37.4019 ")).unwrap();
        assert!((lat - 37.4019).abs() < f64::EPSILON);
        assert!(parse_coordinate(Some("0")).is_some());
    }

    #[test]
    fn rejects_missing_coordinates() {
        assert!(parse_coordinate(None).is_none());
        assert!(parse_coordinate(Some("")).is_none());
        assert!(parse_coordinate(Some("nan")).is_none());
        assert!(parse_coordinate(Some("north")).is_none());
    }
}
