//! Log-scale normalization of cell counts into `[0, 1]` intensities.

use std::collections::BTreeMap;

use ride_map_hexbin_models::CellId;

use crate::aggregate::log_count;

/// Amount the upper bound is widened by when every populated cell has the
/// same count.
pub const FLAT_EPSILON: f64 = 1e-6;

/// Maps each populated cell to an intensity in `[0, 1]`.
///
/// Intensity is `(ln(1 + n) - lo) / (hi - lo)` where `lo`/`hi` are the
/// smallest and largest log counts among cells with `n > 0`. When
/// `lo == hi` the range is widened by [`FLAT_EPSILON`], so every cell maps
/// to 0: uniform density renders at the bottom of the ramp.
///
/// Cells with a zero count are left out of the result; their intensity is
/// undefined rather than 0.
#[must_use]
pub fn normalize(counts: &BTreeMap<CellId, u64>) -> BTreeMap<CellId, f64> {
    let logs: BTreeMap<CellId, f64> = counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(cell, count)| (*cell, log_count(*count)))
        .collect();

    let Some((lo, mut hi)) = bounds(logs.values().copied()) else {
        return BTreeMap::new();
    };

    if hi - lo <= 0.0 {
        hi = lo + FLAT_EPSILON;
    }

    logs.into_iter()
        .map(|(cell, log)| (cell, ((log - lo) / (hi - lo)).clamp(0.0, 1.0)))
        .collect()
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(u64, u64)]) -> BTreeMap<CellId, u64> {
        entries
            .iter()
            .map(|(cell, count)| (CellId::new(*cell), *count))
            .collect()
    }

    #[test]
    fn extremes_map_to_zero_and_one() {
        let intensities = normalize(&counts(&[(1, 1), (2, 5), (3, 40)]));

        assert!(intensities[&CellId::new(1)].abs() < 1e-12);
        assert!((intensities[&CellId::new(3)] - 1.0).abs() < 1e-12);

        let mid = intensities[&CellId::new(2)];
        let expected = (6.0_f64.ln() - 2.0_f64.ln()) / (41.0_f64.ln() - 2.0_f64.ln());
        assert!((mid - expected).abs() < 1e-12);
    }

    #[test]
    fn all_values_within_unit_range() {
        let intensities = normalize(&counts(&[(1, 3), (2, 3), (3, 17), (4, 900), (5, 2)]));
        assert_eq!(intensities.len(), 5);
        for value in intensities.values() {
            assert!((0.0..=1.0).contains(value), "{value}");
        }
    }

    #[test]
    fn uniform_counts_are_flat_at_zero() {
        let intensities = normalize(&counts(&[(1, 4), (2, 4), (3, 4)]));
        assert_eq!(intensities.len(), 3);
        for value in intensities.values() {
            assert!(value.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn single_cell_is_flat_at_zero() {
        let intensities = normalize(&counts(&[(9, 2)]));
        assert!(intensities[&CellId::new(9)].abs() < f64::EPSILON);
    }

    #[test]
    fn zero_counts_are_undefined() {
        let intensities = normalize(&counts(&[(1, 0), (2, 3), (3, 8)]));
        assert!(!intensities.contains_key(&CellId::new(1)));
        assert!(intensities[&CellId::new(2)].abs() < 1e-12);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(normalize(&BTreeMap::new()).is_empty());
        assert!(normalize(&counts(&[(1, 0)])).is_empty());
    }

    #[test]
    fn raising_a_count_never_lowers_its_intensity() {
        let mut c = counts(&[(1, 2), (2, 10), (3, 30)]);
        let mut previous = normalize(&c)[&CellId::new(2)];

        for n in 11..80 {
            c.insert(CellId::new(2), n);
            let current = normalize(&c)[&CellId::new(2)];
            assert!(current >= previous, "count {n}: {current} < {previous}");
            previous = current;
        }
    }
}
