#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hexagonal density binning and color mapping for ride data.
//!
//! A query runs a single synchronous pass over an immutable [`Dataset`]:
//!
//! 1. [`filter`] keeps the rides matching every predicate of a
//!    [`FilterCriteria`],
//! 2. [`aggregate`] assigns each ride with coordinates to an H3 cell and
//!    counts per cell,
//! 3. [`normalize`] compresses counts with `ln(1 + n)` into `[0, 1]`,
//! 4. [`color`] picks a palette entry per intensity,
//! 5. [`scene`] outlines every cell touched by the *unfiltered* data so the
//!    hex lattice stays put while filters change.
//!
//! Per-ride and per-cell faults (bad coordinates, unresolvable boundaries,
//! unparseable palette colors) are absorbed and logged. Only invalid
//! criteria or rendering options fail a query.

pub mod aggregate;
pub mod color;
pub mod dataset;
pub mod filter;
pub mod indexer;
pub mod normalize;
pub mod scene;

pub use dataset::{Dataset, Facets, QueryOptions};
pub use indexer::{H3Indexer, HexIndexer};
pub use ride_map_hexbin_models::{CriteriaError, FilterCriteria, RenderCell};

/// Errors that reject a query before it runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HexbinError {
    /// The filter criteria violate an invariant.
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),

    /// The indexer does not support the requested resolution.
    #[error("Unsupported resolution: {0}")]
    InvalidResolution(u8),

    /// The fill opacity is outside `0..=1`.
    #[error("Fill alpha {0} is outside 0-1")]
    InvalidAlpha(f64),
}
