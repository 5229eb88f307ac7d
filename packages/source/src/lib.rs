#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ride data loading.
//!
//! Reads ride exports in CSV form and turns each row into a
//! [`RideRecord`]. Expected columns are `datetime`, `lat`, `lon`,
//! `inboundOutbound`, `Type` and `busNumber`; any others are ignored.

pub mod parsing;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use ride_map_ride_models::RideRecord;
use serde::Deserialize;

use crate::parsing::{parse_coordinate, parse_ride_datetime};

/// Errors that can occur while loading ride data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The data file could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV was malformed or a required column was missing.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A CSV row as it appears in the export, before normalization.
#[derive(Debug, Deserialize)]
struct RawRide {
    datetime: String,
    #[serde(default)]
    lat: Option<String>,
    #[serde(default)]
    lon: Option<String>,
    #[serde(rename = "inboundOutbound", default)]
    direction: String,
    #[serde(rename = "Type", default)]
    ride_type: String,
    #[serde(rename = "busNumber", default)]
    vehicle_id: String,
}

impl RawRide {
    fn into_record(self) -> Option<RideRecord> {
        let timestamp = parse_ride_datetime(&self.datetime)?;

        Some(RideRecord::new(
            timestamp,
            parse_coordinate(self.lat.as_deref()),
            parse_coordinate(self.lon.as_deref()),
            self.direction,
            self.ride_type,
            self.vehicle_id,
        ))
    }
}

/// Reads ride records from CSV data with a header row.
///
/// Rows whose timestamp cannot be parsed are skipped with a warning.
/// Missing or unparseable coordinates become `None` and the row is kept.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] if the data is not valid CSV or lacks the
/// `datetime` column.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RideRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rides = Vec::new();
    let mut skipped = 0_u64;

    for (i, row) in reader.deserialize::<RawRide>().enumerate() {
        let raw = row?;
        let datetime = raw.datetime.clone();

        match raw.into_record() {
            Some(ride) => rides.push(ride),
            None => {
                // Header is line 1
                log::warn!("Skipping row {}: unparseable datetime {datetime:?}", i + 2);
                skipped += 1;
            }
        }
    }

    let located = rides.iter().filter(|r| r.lat_lng().is_some()).count();
    log::info!(
        "Loaded {} rides ({located} with coordinates, {skipped} skipped)",
        rides.len()
    );

    Ok(rides)
}

/// Loads ride records from a CSV file.
///
/// # Errors
///
/// Returns [`SourceError::Open`] if the file cannot be opened, or any error
/// from [`read_csv`].
pub fn load_csv(path: &Path) -> Result<Vec<RideRecord>, SourceError> {
    log::info!("Loading rides from {}", path.display());

    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    read_csv(BufReader::new(file))
}
