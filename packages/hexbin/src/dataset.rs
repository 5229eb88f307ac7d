//! The loaded ride dataset and the query entry point.
//!
//! A [`Dataset`] is built once from an already-parsed ride collection and
//! is read-only afterwards. The set of cells touched by any ride (the
//! "universe") depends only on the data and the resolution, so it is
//! computed lazily per resolution and kept for the lifetime of the dataset.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use ride_map_hexbin_models::{CellId, FilterCriteria, RenderCell, Rgba, VehicleSelection};
use ride_map_ride_models::{DayOfWeek, RideRecord};
use serde::Serialize;

use crate::aggregate::{aggregate, cell_of};
use crate::color::{ColorMapper, DEFAULT_FILL_ALPHA};
use crate::indexer::{H3Indexer, HexIndexer};
use crate::normalize::normalize;
use crate::{HexbinError, filter, scene};

/// Resolution the dashboard opens with.
pub const DEFAULT_RESOLUTION: u8 = 7;

/// Default first hour of the filter window.
pub const DEFAULT_START_HOUR: f64 = 6.0;

/// Default last hour of the filter window.
pub const DEFAULT_END_HOUR: f64 = 20.0;

/// Rendering parameters for a single query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Cell resolution.
    pub resolution: u8,
    /// Fill opacity for populated cells.
    pub alpha: f64,
    /// Intensity-to-color mapping.
    pub mapper: ColorMapper,
}

impl QueryOptions {
    /// Default palette and opacity at `resolution`.
    #[must_use]
    pub fn new(resolution: u8) -> Self {
        Self {
            resolution,
            alpha: DEFAULT_FILL_ALPHA,
            mapper: ColorMapper::default(),
        }
    }

    /// Sets the fill opacity.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the color mapping.
    #[must_use]
    pub fn with_mapper(mut self, mapper: ColorMapper) -> Self {
        self.mapper = mapper;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

/// Distinct filter values present in a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    /// Days of the week with at least one ride.
    pub weekdays: BTreeSet<DayOfWeek>,
    /// Travel directions.
    pub directions: BTreeSet<String>,
    /// Ride types.
    pub ride_types: BTreeSet<String>,
    /// Vehicle IDs.
    pub vehicles: BTreeSet<String>,
    /// First and last ride date, `None` for an empty dataset.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl Facets {
    /// Criteria that accept everything in the data for one ride type,
    /// within the default hour window.
    ///
    /// Returns `None` for an empty dataset.
    #[must_use]
    pub fn default_criteria(&self, ride_type: &str) -> Option<FilterCriteria> {
        let (start_date, end_date) = self.date_range?;

        Some(FilterCriteria {
            start_date,
            end_date,
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
            weekdays: self.weekdays.clone(),
            directions: self.directions.clone(),
            ride_type: ride_type.to_string(),
            vehicles: VehicleSelection::All,
        })
    }
}

/// An immutable, loaded ride dataset.
pub struct Dataset<I: HexIndexer = H3Indexer> {
    rides: Vec<RideRecord>,
    indexer: I,
    /// Cells touched by any ride, per resolution.
    universes: Mutex<BTreeMap<u8, Arc<BTreeSet<CellId>>>>,
}

impl Dataset<H3Indexer> {
    /// Wraps `rides` using the H3 grid.
    #[must_use]
    pub fn new(rides: Vec<RideRecord>) -> Self {
        Self::with_indexer(rides, H3Indexer)
    }
}

impl<I: HexIndexer> Dataset<I> {
    /// Wraps `rides` using a custom indexer.
    #[must_use]
    pub fn with_indexer(rides: Vec<RideRecord>, indexer: I) -> Self {
        Self {
            rides,
            indexer,
            universes: Mutex::new(BTreeMap::new()),
        }
    }

    /// All rides, in load order.
    #[must_use]
    pub fn rides(&self) -> &[RideRecord] {
        &self.rides
    }

    /// The indexer used for binning.
    #[must_use]
    pub const fn indexer(&self) -> &I {
        &self.indexer
    }

    /// Resolutions whose universe has been computed so far.
    #[must_use]
    pub fn cached_resolutions(&self) -> Vec<u8> {
        self.universes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Every cell touched by a ride with usable coordinates at
    /// `resolution`, ignoring all filters.
    ///
    /// # Errors
    ///
    /// Returns [`HexbinError::InvalidResolution`] if the indexer does not
    /// support `resolution`.
    pub fn universe(&self, resolution: u8) -> Result<Arc<BTreeSet<CellId>>, HexbinError> {
        if !self.indexer.supports_resolution(resolution) {
            return Err(HexbinError::InvalidResolution(resolution));
        }

        let mut universes = self.universes.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cells) = universes.get(&resolution) {
            return Ok(Arc::clone(cells));
        }

        let cells: Arc<BTreeSet<CellId>> = Arc::new(
            self.rides
                .iter()
                .filter_map(|ride| cell_of(&self.indexer, ride, resolution))
                .collect(),
        );
        log::debug!(
            "Indexed {} cells at resolution {resolution} from {} rides",
            cells.len(),
            self.rides.len()
        );

        universes.insert(resolution, Arc::clone(&cells));
        Ok(cells)
    }

    /// Distinct filter values present in the data.
    #[must_use]
    pub fn facets(&self) -> Facets {
        let mut facets = Facets::default();

        for ride in &self.rides {
            facets.weekdays.insert(ride.weekday);
            facets.directions.insert(ride.direction.clone());
            facets.ride_types.insert(ride.ride_type.clone());
            facets.vehicles.insert(ride.vehicle_id.clone());

            let date = ride.date();
            facets.date_range = Some(match facets.date_range {
                None => (date, date),
                Some((min, max)) => (min.min(date), max.max(date)),
            });
        }

        facets
    }

    /// Runs the full pipeline at `resolution` with the default palette and
    /// opacity.
    ///
    /// # Errors
    ///
    /// See [`Dataset::query`].
    pub fn query_at(
        &self,
        criteria: &FilterCriteria,
        resolution: u8,
    ) -> Result<Vec<RenderCell>, HexbinError> {
        self.query(criteria, &QueryOptions::new(resolution))
    }

    /// Filters, bins, normalizes and colors the rides, returning one
    /// polygon per universe cell sorted by cell ID.
    ///
    /// An empty match set is not an error: every cell comes back with the
    /// no-data color.
    ///
    /// # Errors
    ///
    /// * [`HexbinError::InvalidCriteria`] if `criteria` fails validation
    /// * [`HexbinError::InvalidResolution`] if the indexer rejects the
    ///   resolution
    /// * [`HexbinError::InvalidAlpha`] if the opacity is outside `0..=1`
    pub fn query(
        &self,
        criteria: &FilterCriteria,
        options: &QueryOptions,
    ) -> Result<Vec<RenderCell>, HexbinError> {
        criteria.validate()?;

        if !(0.0..=1.0).contains(&options.alpha) {
            return Err(HexbinError::InvalidAlpha(options.alpha));
        }

        let universe = self.universe(options.resolution)?;

        let matched = filter::filter(&self.rides, criteria);
        let cells = aggregate(&self.indexer, matched.iter().copied(), options.resolution);
        let intensities = normalize(cells.counts());

        let colors: BTreeMap<CellId, Rgba> = intensities
            .iter()
            .map(|(cell, t)| (*cell, options.mapper.color_for(Some(*t), options.alpha)))
            .collect();

        let scene = scene::build(
            &self.indexer,
            &universe,
            &cells,
            &colors,
            options.mapper.no_data_color(),
        );

        log::debug!(
            "Query matched {} of {} rides in {} cells; rendering {} cells",
            matched.len(),
            self.rides.len(),
            cells.len(),
            scene.len()
        );

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{NO_DATA_COLOR, Palette};
    use chrono::NaiveDateTime;
    use ride_map_hexbin_models::CriteriaError;

    const HOME: (f64, f64) = (37.4019, -122.1107);
    const CITY: (f64, f64) = (37.7749, -122.4194);

    fn ride(ts: &str, at: Option<(f64, f64)>, ride_type: &str, vehicle: &str) -> RideRecord {
        RideRecord::new(
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            at.map(|(lat, _)| lat),
            at.map(|(_, lng)| lng),
            "Inbound",
            ride_type,
            vehicle,
        )
    }

    fn may_criteria() -> FilterCriteria {
        FilterCriteria {
            start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 31).unwrap(),
            start_hour: 6.0,
            end_hour: 20.0,
            weekdays: DayOfWeek::all().iter().copied().collect(),
            directions: ["Inbound".to_string(), "Outbound".to_string()].into(),
            ride_type: "Near Demand".to_string(),
            vehicles: VehicleSelection::All,
        }
    }

    fn cell(at: (f64, f64)) -> CellId {
        H3Indexer.cell_for(at.0, at.1, DEFAULT_RESOLUTION).unwrap()
    }

    #[test]
    fn two_rides_in_one_cell_are_flat_density() {
        let dataset = Dataset::new(vec![
            ride("2025-05-10 10:00", Some(HOME), "Near Demand", "1"),
            ride("2025-05-10 14:00", Some(HOME), "Near Demand", "1"),
        ]);

        let scene = dataset
            .query_at(&may_criteria(), DEFAULT_RESOLUTION)
            .unwrap();

        assert_eq!(scene.len(), 1);
        assert_eq!(scene[0].cell, cell(HOME));
        assert_eq!(scene[0].count, 2);
        assert_eq!(scene[0].tooltip, "2 rides");
        // flat density: intensity 0, bottom of the ramp
        assert_eq!(scene[0].fill_color, Rgba::new(165, 0, 38, DEFAULT_FILL_ALPHA));
        assert_eq!(scene[0].boundary.first(), scene[0].boundary.last());
    }

    #[test]
    fn densest_cell_gets_top_of_ramp() {
        let dataset = Dataset::new(vec![
            ride("2025-05-10 10:00", Some(HOME), "Near Demand", "1"),
            ride("2025-05-10 11:00", Some(HOME), "Near Demand", "1"),
            ride("2025-05-10 12:00", Some(HOME), "Near Demand", "1"),
            ride("2025-05-10 13:00", Some(CITY), "Near Demand", "1"),
        ]);

        let scene = dataset
            .query_at(&may_criteria(), DEFAULT_RESOLUTION)
            .unwrap();
        let by_cell: BTreeMap<CellId, &RenderCell> = scene.iter().map(|c| (c.cell, c)).collect();

        assert_eq!(by_cell[&cell(HOME)].fill_color, Rgba::new(0, 104, 55, 0.4));
        assert_eq!(by_cell[&cell(CITY)].fill_color, Rgba::new(165, 0, 38, 0.4));
    }

    #[test]
    fn null_coordinates_are_ignored() {
        let dataset = Dataset::new(vec![
            ride("2025-05-10 10:00", None, "Near Demand", "1"),
            ride("2025-05-10 10:00", Some(HOME), "Near Demand", "1"),
        ]);

        let scene = dataset
            .query_at(&may_criteria(), DEFAULT_RESOLUTION)
            .unwrap();

        assert_eq!(scene.len(), 1);
        assert_eq!(scene[0].count, 1);
    }

    #[test]
    fn filtered_out_cells_still_render_as_no_data() {
        let dataset = Dataset::new(vec![
            ride("2025-05-10 10:00", Some(HOME), "Near Demand", "1"),
            ride("2025-05-10 10:00", Some(CITY), "Scheduled", "1"),
        ]);

        let scene = dataset
            .query_at(&may_criteria(), DEFAULT_RESOLUTION)
            .unwrap();
        let by_cell: BTreeMap<CellId, &RenderCell> = scene.iter().map(|c| (c.cell, c)).collect();

        assert_eq!(scene.len(), 2);
        assert_eq!(by_cell[&cell(CITY)].fill_color, NO_DATA_COLOR);
        assert_eq!(by_cell[&cell(CITY)].tooltip, "0 rides");
        assert_eq!(by_cell[&cell(HOME)].count, 1);
    }

    #[test]
    fn empty_match_set_is_all_no_data() {
        let dataset = Dataset::new(vec![
            ride("2025-05-10 10:00", Some(HOME), "Near Demand", "1"),
            ride("2025-05-10 10:00", Some(CITY), "Near Demand", "2"),
        ]);

        let mut criteria = may_criteria();
        criteria.vehicles = VehicleSelection::from_values(["3"]);

        let scene = dataset.query_at(&criteria, DEFAULT_RESOLUTION).unwrap();
        assert_eq!(scene.len(), 2);
        assert!(scene.iter().all(|c| c.fill_color == NO_DATA_COLOR));
        assert!(scene.iter().all(|c| c.count == 0));
    }

    #[test]
    fn scene_covers_exactly_the_full_universe() {
        let rides = vec![
            ride("2025-05-10 10:00", Some(HOME), "Near Demand", "1"),
            ride("2024-01-01 03:00", Some(CITY), "Scheduled", "9"),
            ride("2025-05-10 10:00", None, "Near Demand", "1"),
        ];
        let dataset = Dataset::new(rides);

        let scene = dataset
            .query_at(&may_criteria(), DEFAULT_RESOLUTION)
            .unwrap();
        let cells: BTreeSet<CellId> = scene.iter().map(|c| c.cell).collect();

        assert_eq!(cells, [cell(HOME), cell(CITY)].into());
    }

    #[test]
    fn repeated_queries_are_identical() {
        let dataset = Dataset::new(vec![
            ride("2025-05-10 10:00", Some(HOME), "Near Demand", "1"),
            ride("2025-05-12 09:00", Some(CITY), "Near Demand", "2"),
            ride("2025-05-12 09:30", Some(CITY), "Near Demand", "2"),
        ]);

        let first = dataset
            .query_at(&may_criteria(), DEFAULT_RESOLUTION)
            .unwrap();
        let second = dataset
            .query_at(&may_criteria(), DEFAULT_RESOLUTION)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn universe_is_cached_per_resolution() {
        let dataset = Dataset::new(vec![ride(
            "2025-05-10 10:00",
            Some(HOME),
            "Near Demand",
            "1",
        )]);
        assert!(dataset.cached_resolutions().is_empty());

        let a = dataset.universe(7).unwrap();
        let b = dataset.universe(7).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        dataset.universe(9).unwrap();
        assert_eq!(dataset.cached_resolutions(), vec![7, 9]);
    }

    #[test]
    fn invalid_criteria_are_rejected_before_running() {
        let dataset = Dataset::new(vec![ride(
            "2025-05-10 10:00",
            Some(HOME),
            "Near Demand",
            "1",
        )]);

        let mut criteria = may_criteria();
        criteria.ride_type = String::new();

        assert!(matches!(
            dataset.query_at(&criteria, DEFAULT_RESOLUTION),
            Err(HexbinError::InvalidCriteria(CriteriaError::MissingRideType))
        ));
        assert!(dataset.cached_resolutions().is_empty());
    }

    #[test]
    fn invalid_resolution_and_alpha_are_rejected() {
        let dataset = Dataset::new(Vec::new());

        assert!(matches!(
            dataset.query_at(&may_criteria(), 16),
            Err(HexbinError::InvalidResolution(16))
        ));
        assert!(matches!(
            dataset.query(&may_criteria(), &QueryOptions::default().with_alpha(1.5)),
            Err(HexbinError::InvalidAlpha(_))
        ));
    }

    #[test]
    fn custom_palette_and_alpha_are_applied() {
        let dataset = Dataset::new(vec![ride(
            "2025-05-10 10:00",
            Some(HOME),
            "Near Demand",
            "1",
        )]);
        let options = QueryOptions::new(DEFAULT_RESOLUTION)
            .with_alpha(0.8)
            .with_mapper(ColorMapper::new(Palette::from_entries([
                "#102030", "#ffffff",
            ])));

        let scene = dataset.query(&may_criteria(), &options).unwrap();
        assert_eq!(scene[0].fill_color, Rgba::new(0x10, 0x20, 0x30, 0.8));
    }

    #[test]
    fn facets_collect_distinct_values() {
        let dataset = Dataset::new(vec![
            ride("2025-05-10 10:00", Some(HOME), "Near Demand", "1"),
            ride("2025-05-03 10:00", Some(HOME), "Scheduled", "2"),
            ride("2025-05-21 10:00", None, "Near Demand", "1"),
        ]);

        let facets = dataset.facets();
        assert_eq!(facets.ride_types.len(), 2);
        assert_eq!(facets.vehicles.len(), 2);
        assert_eq!(facets.directions, ["Inbound".to_string()].into());
        assert_eq!(
            facets.date_range,
            Some((
                NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 21).unwrap(),
            ))
        );

        let criteria = facets.default_criteria("Near Demand").unwrap();
        assert_eq!(criteria.validate(), Ok(()));
        assert_eq!(criteria.vehicles, VehicleSelection::All);
        assert!(Dataset::new(Vec::new()).facets().default_criteria("x").is_none());
    }
}
