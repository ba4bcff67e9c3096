//! Formation grid layout.
//!
//! A unit arranges its live soldiers on a `rows × cols` grid centered on the
//! commanded point. The row count is fixed at spawn so the block keeps its
//! depth while the roster shrinks.

use glam::DVec3;

use crate::profiles::UnitProfile;

/// Grid cell of one roster slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// Columns needed to seat `count` soldiers in `rows` rows.
pub fn columns(count: usize, rows: usize) -> usize {
    if rows == 0 {
        return 0;
    }
    count.div_ceil(rows)
}

/// Cell of roster slot `index` in a grid `cols` wide.
pub fn cell(index: usize, cols: usize) -> Cell {
    Cell {
        row: index / cols,
        col: index % cols,
    }
}

/// Local offsets for `count` soldiers, in roster order.
///
/// Empty when there is nobody to place or the profile has no rows.
pub fn offsets(count: usize, profile: &UnitProfile) -> Vec<DVec3> {
    let cols = columns(count, profile.rows);
    if cols == 0 {
        return Vec::new();
    }

    let half_width = (cols - 1) as f64 * profile.col_spacing / 2.0;
    // Depth is centered with the column spacing, matching the spawn layout.
    let half_depth = (profile.rows - 1) as f64 * profile.col_spacing / 2.0;

    (0..count)
        .map(|i| {
            let Cell { row, col } = cell(i, cols);
            DVec3::new(
                col as f64 * profile.col_spacing - half_width,
                0.0,
                row as f64 * profile.row_spacing - half_depth,
            )
        })
        .collect()
}

/// World-space slots for `count` soldiers around `center`.
pub fn targets(center: DVec3, count: usize, profile: &UnitProfile) -> Vec<DVec3> {
    let center = DVec3::new(center.x, 0.0, center.z);
    offsets(count, profile)
        .into_iter()
        .map(|offset| center + offset)
        .collect()
}
