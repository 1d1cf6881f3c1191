//! Geometry validation and repair.

mod repair;
mod segments;
mod validate;

pub use repair::{count_invalid, repair, repair_file, RepairOptions, RepairOutcome, DEFAULT_MIN_POLYGON_AREA};
pub use validate::{check_shape, is_valid_shape, Invalidity};

use geo::{Coord, LineString, Polygon};

/// Exterior ring followed by the holes of a polygon.
pub(crate) fn rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

/// Collect coordinates, skipping consecutive repeats.
pub(crate) fn dedup_coords(coords: impl IntoIterator<Item = Coord<f64>>) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::new();
    for coord in coords {
        if out.last() != Some(&coord) { out.push(coord) }
    }
    out
}
