//! Layered configuration for map rendering.
//!
//! The compiled-in `config/defaults.toml` is the base layer. A user file is
//! merged over it table by table, so a file that only sets
//! `render.resolution` keeps every other default. Command line flags are
//! applied by the caller afterwards.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ride_map_hexbin::Facets;
use ride_map_hexbin::color::{ColorForm, ColorMapper, NO_DATA_COLOR, Palette};
use ride_map_hexbin_models::{FilterCriteria, PaletteName, VehicleSelection};
use ride_map_ride_models::DayOfWeek;
use serde::Deserialize;

const DEFAULTS_TOML: &str = include_str!("../config/defaults.toml");

/// Resolutions offered for rendering.
pub const RESOLUTIONS: RangeInclusive<u8> = 5..=10;

/// Errors that can occur while loading or applying configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML could not be parsed.
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// `render.resolution` is outside [`RESOLUTIONS`].
    #[error("Resolution {0} is outside 5-10")]
    InvalidResolution(u8),

    /// Neither the config nor the data provide a date.
    #[error("No date range: set filters.start_date and filters.end_date or load rides")]
    NoDateRange,

    /// The no-data color is not a recognized color form.
    #[error("Unrecognized no-data color '{0}'")]
    InvalidColor(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RideMapConfig {
    /// Which rides to count.
    pub filters: FiltersConfig,
    /// How to draw them.
    pub render: RenderConfig,
}

/// The `[filters]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FiltersConfig {
    /// First day to include. Defaults to the first ride date.
    pub start_date: Option<NaiveDate>,
    /// Last day to include. Defaults to the last ride date.
    pub end_date: Option<NaiveDate>,
    /// First hour to include, in half-hour steps. Defaults to 6.
    pub start_hour: Option<f64>,
    /// Last hour to include, in half-hour steps. Defaults to 20.
    pub end_hour: Option<f64>,
    /// The single ride type to count, e.g. `"Near Demand"`.
    pub ride_type: String,
    /// Vehicle IDs; `"ALL"` disables the filter.
    pub vehicles: Vec<String>,
    /// Defaults to every weekday present in the data.
    pub weekdays: Option<Vec<DayOfWeek>>,
    /// Defaults to every direction present in the data.
    pub directions: Option<Vec<String>>,
}

/// The `[render]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderConfig {
    /// Hex resolution, within [`RESOLUTIONS`].
    pub resolution: u8,
    /// Fill opacity of populated cells.
    pub alpha: f64,
    /// Built-in ramp, ignored when `colors` is set.
    pub palette: PaletteName,
    /// Custom ramp, lowest density first.
    pub colors: Option<Vec<String>>,
    /// Fill for cells without matching rides. `#rrggbb` and `rgb()` forms
    /// get an opacity of 0.1.
    pub no_data_color: String,
}

impl RideMapConfig {
    /// The compiled-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the embedded defaults are malformed.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_layers(None)
    }

    /// Loads the defaults, merged with the file at `path` if given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read,
    /// [`ConfigError::Parse`] if either layer is invalid, or
    /// [`ConfigError::InvalidResolution`] if the merged resolution is out of
    /// range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Self::defaults();
        };

        log::info!("Loading config from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_layers(Some(&contents))
    }

    fn from_layers(user: Option<&str>) -> Result<Self, ConfigError> {
        let mut base: toml::Table = toml::from_str(DEFAULTS_TOML)?;

        if let Some(user) = user {
            let overlay: toml::Table = toml::from_str(user)?;
            merge(&mut base, overlay);
        }

        let config: Self = toml::Value::Table(base).try_into()?;

        if !RESOLUTIONS.contains(&config.render.resolution) {
            return Err(ConfigError::InvalidResolution(config.render.resolution));
        }

        Ok(config)
    }

    /// Resolves the filters against the loaded data.
    ///
    /// Starts from [`Facets::default_criteria`] and applies every configured
    /// filter on top. Unset weekdays and directions keep every value found
    /// in the data. An unset end date is the last ride date, but never
    /// earlier than the start date, so a start date past the data yields an
    /// empty map rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDateRange`] if the data is empty and no date
    /// is configured.
    pub fn criteria(&self, facets: &Facets) -> Result<FilterCriteria, ConfigError> {
        let filters = &self.filters;

        let date_range = match facets.date_range {
            Some(range) => range,
            None => {
                let date = filters
                    .start_date
                    .or(filters.end_date)
                    .ok_or(ConfigError::NoDateRange)?;
                (date, date)
            }
        };

        let mut criteria = Facets {
            date_range: Some(date_range),
            ..facets.clone()
        }
        .default_criteria(&filters.ride_type)
        .ok_or(ConfigError::NoDateRange)?;

        if let Some(date) = filters.start_date {
            criteria.start_date = date;
        }
        criteria.end_date = filters
            .end_date
            .unwrap_or_else(|| criteria.end_date.max(criteria.start_date));

        if let Some(hour) = filters.start_hour {
            criteria.start_hour = hour;
        }
        if let Some(hour) = filters.end_hour {
            criteria.end_hour = hour;
        }
        if let Some(days) = &filters.weekdays {
            criteria.weekdays = days.iter().copied().collect();
        }
        if let Some(directions) = &filters.directions {
            criteria.directions = directions.iter().cloned().collect();
        }
        criteria.vehicles = VehicleSelection::from_values(&filters.vehicles);

        Ok(criteria)
    }

    /// Builds the color mapping from the `[render]` table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidColor`] if the no-data color is not a
    /// recognized color form.
    pub fn mapper(&self) -> Result<ColorMapper, ConfigError> {
        let render = &self.render;

        let palette = match &render.colors {
            Some(colors) => {
                if colors.is_empty() {
                    log::warn!("Empty custom palette, every cell gets the no-data color");
                }
                Palette::from_entries(colors)
            }
            None => Palette::from(render.palette),
        };

        let no_data = match ColorForm::parse(&render.no_data_color) {
            ColorForm::Unknown(raw) => return Err(ConfigError::InvalidColor(raw)),
            form => form.to_rgba(NO_DATA_COLOR.a),
        };

        Ok(ColorMapper::new(palette).with_no_data_color(no_data))
    }
}

/// Recursively merges `overlay` into `base`. Nested tables are merged,
/// every other value is replaced.
fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let toml::Value::Table(incoming) = value else {
            base.insert(key, value);
            continue;
        };

        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge(existing, incoming);
            continue;
        }

        base.insert(key, toml::Value::Table(incoming));
    }
}
