//! Point-to-cell and cell-to-polygon lookups.
//!
//! The pipeline only talks to the [`HexIndexer`] trait so tests can swap in
//! a deterministic fake. [`H3Indexer`] is the production implementation on
//! top of `h3o`.

use h3o::{CellIndex, Resolution};
use ride_map_hexbin_models::{CellId, LatLng};

/// Errors produced by a [`HexIndexer`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexError {
    /// The coordinates are not a valid WGS84 position.
    #[error("invalid coordinates ({lat}, {lng})")]
    InvalidCoordinates {
        /// Latitude.
        lat: f64,
        /// Longitude.
        lng: f64,
    },

    /// The resolution is not supported by the indexer.
    #[error("unsupported resolution {0}")]
    InvalidResolution(u8),

    /// The identifier does not name a valid cell.
    #[error("invalid cell {0}")]
    InvalidCell(CellId),
}

/// Maps coordinates onto discrete hexagonal cells and back to outlines.
pub trait HexIndexer: Send + Sync {
    /// Returns the cell containing `(lat, lng)` at `resolution`.
    ///
    /// # Errors
    ///
    /// Returns an error for out-of-range coordinates or an unsupported
    /// resolution.
    fn cell_for(&self, lat: f64, lng: f64, resolution: u8) -> Result<CellId, IndexError>;

    /// Returns the open vertex ring outlining `cell`.
    ///
    /// # Errors
    ///
    /// Returns an error if `cell` is not a valid cell identifier.
    fn boundary_of(&self, cell: CellId) -> Result<Vec<LatLng>, IndexError>;

    /// Returns `true` if `resolution` can be indexed at all.
    fn supports_resolution(&self, _resolution: u8) -> bool {
        true
    }
}

/// [`HexIndexer`] backed by the H3 grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct H3Indexer;

impl H3Indexer {
    /// Resolves a raw resolution number.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidResolution`] above resolution 15.
    pub fn resolution(resolution: u8) -> Result<Resolution, IndexError> {
        Resolution::try_from(resolution).map_err(|_| IndexError::InvalidResolution(resolution))
    }
}

impl HexIndexer for H3Indexer {
    fn cell_for(&self, lat: f64, lng: f64, resolution: u8) -> Result<CellId, IndexError> {
        let res = Self::resolution(resolution)?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(IndexError::InvalidCoordinates { lat, lng });
        }

        let coord =
            h3o::LatLng::new(lat, lng).map_err(|_| IndexError::InvalidCoordinates { lat, lng })?;

        Ok(CellId::new(u64::from(coord.to_cell(res))))
    }

    fn boundary_of(&self, cell: CellId) -> Result<Vec<LatLng>, IndexError> {
        let index = CellIndex::try_from(cell.raw()).map_err(|_| IndexError::InvalidCell(cell))?;

        Ok(index
            .boundary()
            .iter()
            .map(|vertex| LatLng::new(vertex.lat(), vertex.lng()))
            .collect())
    }

    fn supports_resolution(&self, resolution: u8) -> bool {
        Self::resolution(resolution).is_ok()
    }
}
