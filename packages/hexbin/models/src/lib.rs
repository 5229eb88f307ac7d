#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hexbin query, color, and render cell types.
//!
//! These are the value objects passed into and out of the density pipeline
//! in `ride_map_hexbin`: the filter criteria a caller submits, the cell
//! identifiers the indexer produces, and the colored polygons handed back
//! for rendering.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use ride_map_ride_models::DayOfWeek;
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Vehicle selection value that accepts every vehicle.
pub const ALL_VEHICLES: &str = "ALL";

/// Latest hour a filter window may end at.
pub const MAX_HOUR: f64 = 23.5;

/// Opaque identifier of a hexagonal cell at some resolution.
///
/// Wraps the raw 64-bit H3 index. Cells from different resolutions are not
/// comparable in any geographic sense, but the ordering is total so scenes
/// can be sorted deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u64);

impl CellId {
    /// Wraps a raw cell index.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw cell index.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for CellId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

impl Serialize for CellId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A boundary vertex in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl LatLng {
    /// Creates a vertex.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Which vehicles a query accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VehicleSelection {
    /// Every vehicle matches.
    #[default]
    All,
    /// Only the listed vehicle IDs match.
    Only(BTreeSet<String>),
}

impl VehicleSelection {
    /// Builds a selection from raw dropdown values.
    ///
    /// If [`ALL_VEHICLES`] appears anywhere in `values` the result is
    /// [`VehicleSelection::All`], regardless of the other entries.
    #[must_use]
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if ids.contains(ALL_VEHICLES) {
            Self::All
        } else {
            Self::Only(ids)
        }
    }

    /// Returns `true` if `vehicle_id` passes this selection.
    #[must_use]
    pub fn accepts(&self, vehicle_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(vehicle_id),
        }
    }
}

/// Reasons a [`FilterCriteria`] is rejected before the pipeline runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CriteriaError {
    /// The date range is inverted.
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// An hour bound is outside `0..=23.5` or not on a half hour.
    #[error("hour {hour} is not a half-hour value between 0 and 23.5")]
    InvalidHour {
        /// The offending bound.
        hour: f64,
    },

    /// The hour range is inverted.
    #[error("start hour {start} is after end hour {end}")]
    InvertedHourRange {
        /// Requested start hour.
        start: f64,
        /// Requested end hour.
        end: f64,
    },

    /// No ride type was selected.
    #[error("a ride type must be selected")]
    MissingRideType,
}

/// The full set of filters applied to rides before binning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// First calendar date included.
    pub start_date: NaiveDate,
    /// Last calendar date included.
    pub end_date: NaiveDate,
    /// First hour of day included (half-hour steps).
    pub start_hour: f64,
    /// Last hour of day included (half-hour steps).
    pub end_hour: f64,
    /// Accepted days of the week.
    pub weekdays: BTreeSet<DayOfWeek>,
    /// Accepted travel directions.
    pub directions: BTreeSet<String>,
    /// The single accepted ride type.
    pub ride_type: String,
    /// Accepted vehicles.
    pub vehicles: VehicleSelection,
}

impl FilterCriteria {
    /// Checks the range and selection invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`CriteriaError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if self.start_date > self.end_date {
            return Err(CriteriaError::InvertedDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        for hour in [self.start_hour, self.end_hour] {
            if !is_valid_hour(hour) {
                return Err(CriteriaError::InvalidHour { hour });
            }
        }

        if self.start_hour > self.end_hour {
            return Err(CriteriaError::InvertedHourRange {
                start: self.start_hour,
                end: self.end_hour,
            });
        }

        if self.ride_type.trim().is_empty() {
            return Err(CriteriaError::MissingRideType);
        }

        Ok(())
    }
}

fn is_valid_hour(hour: f64) -> bool {
    (0.0..=MAX_HOUR).contains(&hour) && (hour * 2.0).fract().abs() < f64::EPSILON
}

/// An RGBA fill color. Channels are 0-255, alpha is 0-1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Opacity.
    pub a: f64,
}

impl Rgba {
    /// Creates a color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Built-in diverging color ramps, low density first.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum PaletteName {
    /// Red, yellow, green.
    #[default]
    RdYlGn,
    /// Red, yellow, blue.
    RdYlBu,
    /// Red through violet via yellow and green.
    Spectral,
}

impl PaletteName {
    /// Returns the ramp's color strings, lowest density first.
    #[must_use]
    pub const fn entries(self) -> &'static [&'static str] {
        match self {
            Self::RdYlGn => &[
                "rgb(165,0,38)",
                "rgb(215,48,39)",
                "rgb(244,109,67)",
                "rgb(253,174,97)",
                "rgb(254,224,139)",
                "rgb(255,255,191)",
                "rgb(217,239,139)",
                "rgb(166,217,106)",
                "rgb(102,189,99)",
                "rgb(26,152,80)",
                "rgb(0,104,55)",
            ],
            Self::RdYlBu => &[
                "rgb(165,0,38)",
                "rgb(215,48,39)",
                "rgb(244,109,67)",
                "rgb(253,174,97)",
                "rgb(254,224,144)",
                "rgb(255,255,191)",
                "rgb(224,243,248)",
                "rgb(171,217,233)",
                "rgb(116,173,209)",
                "rgb(69,117,180)",
                "rgb(49,54,149)",
            ],
            Self::Spectral => &[
                "rgb(158,1,66)",
                "rgb(213,62,79)",
                "rgb(244,109,67)",
                "rgb(253,174,97)",
                "rgb(254,224,139)",
                "rgb(255,255,191)",
                "rgb(230,245,152)",
                "rgb(171,221,164)",
                "rgb(102,194,165)",
                "rgb(50,136,189)",
                "rgb(94,79,162)",
            ],
        }
    }

    /// Returns all built-in palettes.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::RdYlGn, Self::RdYlBu, Self::Spectral]
    }
}

/// One renderable hexagon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderCell {
    /// The cell this polygon outlines.
    pub cell: CellId,
    /// Closed vertex ring; the first vertex is repeated at the end.
    pub boundary: Vec<LatLng>,
    /// Fill color.
    pub fill_color: Rgba,
    /// Number of filtered rides in the cell.
    pub count: u64,
    /// Hover text, e.g. `"12 rides"`.
    pub tooltip: String,
}
