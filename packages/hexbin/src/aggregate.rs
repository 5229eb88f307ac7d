//! Per-cell ride counting.

use std::collections::BTreeMap;

use ride_map_hexbin_models::CellId;
use ride_map_ride_models::RideRecord;

use crate::indexer::HexIndexer;

/// Raw ride counts per cell for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellAggregate {
    counts: BTreeMap<CellId, u64>,
}

impl CellAggregate {
    /// Raw count for `cell`, zero if no ride landed there.
    #[must_use]
    pub fn count(&self, cell: CellId) -> u64 {
        self.counts.get(&cell).copied().unwrap_or(0)
    }

    /// `ln(1 + count)` for `cell`.
    #[must_use]
    pub fn log_count(&self, cell: CellId) -> f64 {
        log_count(self.count(cell))
    }

    /// The underlying count map. Only cells with at least one ride appear.
    #[must_use]
    pub const fn counts(&self) -> &BTreeMap<CellId, u64> {
        &self.counts
    }

    /// Total number of binned rides.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of cells holding at least one ride.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if no ride was binned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<CellId> for CellAggregate {
    fn from_iter<T: IntoIterator<Item = CellId>>(iter: T) -> Self {
        let mut counts = BTreeMap::new();
        for cell in iter {
            *counts.entry(cell).or_insert(0) += 1;
        }
        Self { counts }
    }
}

/// `ln(1 + count)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn log_count(count: u64) -> f64 {
    (count as f64).ln_1p()
}

/// Locates the cell of `ride`.
///
/// Returns `None` for rides without both coordinates, or whose coordinates
/// the indexer rejects.
pub fn cell_of<I>(indexer: &I, ride: &RideRecord, resolution: u8) -> Option<CellId>
where
    I: HexIndexer + ?Sized,
{
    let (lat, lng) = ride.lat_lng()?;
    match indexer.cell_for(lat, lng, resolution) {
        Ok(cell) => Some(cell),
        Err(e) => {
            log::debug!("Skipping ride at {}: {e}", ride.timestamp);
            None
        }
    }
}

/// Bins `rides` into cells at `resolution` and counts them.
pub fn aggregate<'a, I>(
    indexer: &I,
    rides: impl IntoIterator<Item = &'a RideRecord>,
    resolution: u8,
) -> CellAggregate
where
    I: HexIndexer + ?Sized,
{
    rides
        .into_iter()
        .filter_map(|ride| cell_of(indexer, ride, resolution))
        .collect()
}
