//! Multi-predicate ride filtering.

use ride_map_hexbin_models::FilterCriteria;
use ride_map_ride_models::RideRecord;

/// Returns `true` if `ride` satisfies every predicate in `criteria`.
///
/// Dates compare at calendar-day granularity. Hours compare the ride's
/// whole hour against the (possibly half-hour) bounds, so an end hour of
/// 14.5 admits everything from 14:00 to 14:59.
#[must_use]
pub fn matches(criteria: &FilterCriteria, ride: &RideRecord) -> bool {
    let date = ride.date();
    let hour = f64::from(ride.hour());

    date >= criteria.start_date
        && date <= criteria.end_date
        && hour >= criteria.start_hour
        && hour <= criteria.end_hour
        && criteria.weekdays.contains(&ride.weekday)
        && criteria.directions.contains(&ride.direction)
        && ride.ride_type == criteria.ride_type
        && criteria.vehicles.accepts(&ride.vehicle_id)
}

/// Selects the rides matching `criteria`, preserving input order.
#[must_use]
pub fn filter<'a>(rides: &'a [RideRecord], criteria: &FilterCriteria) -> Vec<&'a RideRecord> {
    rides.iter().filter(|ride| matches(criteria, ride)).collect()
}
