#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ride record types shared across the ride map workspace.
//!
//! A [`RideRecord`] is one observed vehicle trip: when it happened, where
//! (if the coordinates are known), and the categorical attributes the
//! dashboard filters on. Records are built once at load time and never
//! mutated afterwards.

use chrono::{Datelike as _, NaiveDate, NaiveDateTime, Timelike as _, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Day of the week a ride happened on.
///
/// Displays and parses as the full English day name (`"Monday"`), which is
/// how weekdays appear in exported ride data and in filter selections.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum DayOfWeek {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl DayOfWeek {
    /// Returns all variants of this enum, Monday first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

/// A single observed ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRecord {
    /// When the ride happened (local time, no zone).
    pub timestamp: NaiveDateTime,
    /// Latitude (WGS84), `None` when the source row had no usable value.
    pub latitude: Option<f64>,
    /// Longitude (WGS84), `None` when the source row had no usable value.
    pub longitude: Option<f64>,
    /// Day of the week, derived from `timestamp`.
    pub weekday: DayOfWeek,
    /// Travel direction, e.g. `"Inbound"` / `"Outbound"`.
    pub direction: String,
    /// Ride type, e.g. `"Near Demand"`.
    pub ride_type: String,
    /// Identifier of the vehicle that served the ride.
    pub vehicle_id: String,
}

impl RideRecord {
    /// Creates a record, deriving `weekday` from `timestamp`.
    #[must_use]
    pub fn new(
        timestamp: NaiveDateTime,
        latitude: Option<f64>,
        longitude: Option<f64>,
        direction: impl Into<String>,
        ride_type: impl Into<String>,
        vehicle_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            weekday: timestamp.weekday().into(),
            direction: direction.into(),
            ride_type: ride_type.into(),
            vehicle_id: vehicle_id.into(),
        }
    }

    /// Calendar date of the ride.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Hour of day (0-23) of the ride.
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Returns `(latitude, longitude)` if both coordinates are present.
    #[must_use]
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn weekday_is_derived_from_timestamp() {
        // 2025-05-10 was a Saturday
        let ride = RideRecord::new(
            at("2025-05-10", "10:00:00"),
            Some(37.4),
            Some(-122.1),
            "Inbound",
            "Near Demand",
            "12",
        );
        assert_eq!(ride.weekday, DayOfWeek::Saturday);
        assert_eq!(ride.hour(), 10);
        assert_eq!(ride.date(), NaiveDate::from_ymd_opt(2025, 5, 10).unwrap());
    }

    #[test]
    fn lat_lng_requires_both_coordinates() {
        let ts = at("2025-05-10", "10:00:00");
        let missing_lat = RideRecord::new(ts, None, Some(-122.1), "Inbound", "Near Demand", "1");
        let missing_lng = RideRecord::new(ts, Some(37.4), None, "Inbound", "Near Demand", "1");
        let both = RideRecord::new(ts, Some(37.4), Some(-122.1), "Inbound", "Near Demand", "1");

        assert!(missing_lat.lat_lng().is_none());
        assert!(missing_lng.lat_lng().is_none());
        assert_eq!(both.lat_lng(), Some((37.4, -122.1)));
    }

    #[test]
    fn day_of_week_parses_day_names() {
        assert_eq!("Monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("sunday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Sunday);
        assert!("Funday".parse::<DayOfWeek>().is_err());
        assert_eq!(DayOfWeek::Wednesday.to_string(), "Wednesday");
    }

    #[test]
    fn day_of_week_covers_chrono_weekdays() {
        for (day, weekday) in DayOfWeek::all().iter().zip([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]) {
            assert_eq!(*day, DayOfWeek::from(weekday));
        }
    }
}
