//! Assembles renderable hexagons for every cell in the lattice.

use std::collections::{BTreeMap, BTreeSet};

use ride_map_hexbin_models::{CellId, LatLng, RenderCell, Rgba};

use crate::aggregate::CellAggregate;
use crate::indexer::HexIndexer;

/// Hover text for a cell holding `count` rides.
#[must_use]
pub fn tooltip(count: u64) -> String {
    format!("{count} rides")
}

/// Repeats the first vertex at the end so the ring is closed.
///
/// Returns `None` for an empty ring.
#[must_use]
pub fn close_ring(mut ring: Vec<LatLng>) -> Option<Vec<LatLng>> {
    let first = *ring.first()?;
    ring.push(first);
    Some(ring)
}

/// Builds one [`RenderCell`] per universe cell, in cell order.
///
/// Cells with an entry in `colors` use that fill; the rest use `no_data`
/// and a `"0 rides"` tooltip. A cell whose boundary cannot be resolved is
/// left out and the rest of the scene is still built.
pub fn build<I>(
    indexer: &I,
    universe: &BTreeSet<CellId>,
    aggregate: &CellAggregate,
    colors: &BTreeMap<CellId, Rgba>,
    no_data: Rgba,
) -> Vec<RenderCell>
where
    I: HexIndexer + ?Sized,
{
    let mut skipped = 0_usize;

    let cells: Vec<RenderCell> = universe
        .iter()
        .filter_map(|&cell| {
            let ring = match indexer.boundary_of(cell) {
                Ok(ring) => ring,
                Err(e) => {
                    log::warn!("Skipping cell {cell}: {e}");
                    skipped += 1;
                    return None;
                }
            };

            let Some(boundary) = close_ring(ring) else {
                log::warn!("Skipping cell {cell}: empty boundary");
                skipped += 1;
                return None;
            };

            let count = aggregate.count(cell);
            let fill_color = colors.get(&cell).copied().unwrap_or(no_data);

            Some(RenderCell {
                cell,
                boundary,
                fill_color,
                count,
                tooltip: tooltip(count),
            })
        })
        .collect();

    if skipped > 0 {
        log::info!("Built {} cells, skipped {skipped} without a boundary", cells.len());
    }

    cells
}
