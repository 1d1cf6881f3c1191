use std::path::Path;

use geo::{Area, BooleanOps, LineString, MultiPolygon, Polygon};
use tracing::{debug, info};

use crate::error::Result;
use crate::geom::{dedup_coords, validate::{check_shape, is_valid_shape}};
use crate::io::{FeatureCollection, Shape};

/// Sub-polygons smaller than this (source projection units, m²) are dropped by default.
/// 100 km² keeps real islands and drops coastal specks.
pub const DEFAULT_MIN_POLYGON_AREA: f64 = 1e8;

/// Controls for [`repair`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairOptions {
    /// Parts of a multi-part shape below this area are discarded.
    pub min_area: f64,
    /// Trust the input geometry and only apply area filtering.
    pub skip_validation: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self { min_area: DEFAULT_MIN_POLYGON_AREA, skip_validation: false }
    }
}

impl RepairOptions {
    /// Validity repair without any area filtering.
    pub fn repair_only() -> Self {
        Self { min_area: 0.0, skip_validation: false }
    }
}

/// Counts gathered while repairing a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Sub-polygons discarded by area filtering, across all features.
    /// Parts kept because every part of their feature is under the threshold
    /// are not counted.
    pub dropped: usize,
    /// Features whose geometry was replaced by a repaired one.
    pub repaired: usize,
    /// Invalid features passed through unchanged because repair left nothing.
    pub unrecoverable: usize,
}

/// Repair and filter every feature of `collection`, returning the new collection.
///
/// Every geometry is parsed before anything is changed, so a malformed feature
/// aborts the whole operation. Features that need no change keep their original
/// geometry JSON.
pub fn repair(collection: &FeatureCollection, options: &RepairOptions) -> Result<(FeatureCollection, RepairOutcome)> {
    let shapes = collection.shapes()?;
    let mut repaired = collection.clone();
    let mut outcome = RepairOutcome::default();

    for (idx, original) in shapes.iter().enumerate() {
        let result = repair_shape(original, options);
        outcome.dropped += result.dropped;
        match result.validity {
            Validity::Repaired => outcome.repaired += 1,
            Validity::Unrecoverable => {
                debug!("[repair] feature {idx}: repair produced an empty shape, keeping original");
                outcome.unrecoverable += 1;
            }
            Validity::Unchanged => {}
        }
        if let Some(shape) = result.shape {
            repaired.set_shape(idx, &shape);
        }
    }

    Ok((repaired, outcome))
}

/// Read `src`, repair it and write the result to `dst`. Nothing is written if any feature fails to parse.
pub fn repair_file(src: &Path, dst: &Path, options: &RepairOptions) -> Result<RepairOutcome> {
    let collection = FeatureCollection::read(src)?;
    let (repaired, outcome) = repair(&collection, options)?;
    repaired.write(dst)?;

    info!(
        "Cleaned geometry: repaired {} features, dropped {} tiny sub-polygons (threshold {:.0e}) -> {}",
        outcome.repaired, outcome.dropped, options.min_area, dst.display(),
    );
    Ok(outcome)
}

/// Number of features whose geometry is invalid or not simple.
pub fn count_invalid(collection: &FeatureCollection) -> Result<usize> {
    Ok(collection.shapes()?.iter().filter(|shape| !is_valid_shape(shape)).count())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Validity { Unchanged, Repaired, Unrecoverable }

struct ShapeRepair {
    shape: Option<Shape>, // None when the original geometry stays as is
    dropped: usize,
    validity: Validity,
}

fn repair_shape(original: &Shape, options: &RepairOptions) -> ShapeRepair {
    let mut validity = Validity::Unchanged;
    let mut fixed = None;

    if !options.skip_validation {
        if let Some(issue) = check_shape(original) {
            debug!("[repair] invalid geometry: {issue:?}");
            fixed = make_valid(original);
            validity = if fixed.is_some() { Validity::Repaired } else { Validity::Unrecoverable };
        }
    }

    let current = fixed.as_ref().unwrap_or(original);
    match drop_small_parts(current, options.min_area) {
        Some((filtered, dropped)) => ShapeRepair { shape: Some(filtered), dropped, validity },
        None => ShapeRepair { shape: fixed, dropped: 0, validity },
    }
}

/// Discard parts of a multi-part shape whose area is below `min_area`.
/// Returns `None` when nothing would be discarded, or when everything would be.
fn drop_small_parts(shape: &Shape, min_area: f64) -> Option<(Shape, usize)> {
    let Shape::MultiPolygon(mp) = shape else { return None };

    let kept = mp.0.iter()
        .filter(|part| part.unsigned_area() >= min_area)
        .cloned()
        .collect::<Vec<_>>();
    let dropped = mp.0.len() - kept.len();

    (dropped > 0 && !kept.is_empty()).then(|| (Shape::from_parts(kept), dropped))
}

/// Rebuild a shape as a valid one: self-intersecting rings are split into
/// separate parts and overlapping parts are merged.
/// Returns `None` if nothing with positive area remains.
pub(crate) fn make_valid(shape: &Shape) -> Option<Shape> {
    let parts = shape.parts().iter()
        .filter_map(clean_polygon)
        .fold(MultiPolygon::new(vec![]), |acc, polygon| acc.union(&polygon))
        .0.into_iter()
        .filter(|part| part.unsigned_area() > 0.0)
        .collect::<Vec<_>>();

    (!parts.is_empty()).then(|| Shape::from_parts(parts))
}

/// Drop non-finite coordinates, repeated vertices and degenerate rings.
fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors = polygon.interiors().iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut coords = dedup_coords(ring.coords().copied().filter(|c| c.x.is_finite() && c.y.is_finite()));
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last()) {
        if first != *last { coords.push(first) }
    }
    (coords.len() >= 4).then(|| LineString(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use serde_json::{json, Value};

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![(x: x, y: y), (x: x + size, y: y), (x: x + size, y: y + size), (x: x, y: y + size)]
    }

    fn bowtie() -> Polygon<f64> {
        polygon![(x: 0., y: 0.), (x: 2., y: 2.), (x: 2., y: 0.), (x: 0., y: 2.)]
    }

    fn collection(shapes: &[Shape]) -> FeatureCollection {
        let features = shapes.iter().enumerate()
            .map(|(i, shape)| json!({
                "type": "Feature",
                "properties": { "statenam": format!("State {i}") },
                "geometry": shape.to_geojson(),
            }))
            .collect::<Vec<Value>>();
        FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "name": "states",
            "features": features,
        })).unwrap()
    }

    #[test]
    fn valid_input_is_untouched() {
        let fc = collection(&[
            Shape::Polygon(square(0., 0., 10.)),
            Shape::MultiPolygon(MultiPolygon(vec![square(0., 0., 1.), square(5., 5., 1.)])),
        ]);
        let (repaired, outcome) = repair(&fc, &RepairOptions::repair_only()).unwrap();
        assert_eq!(repaired, fc);
        assert_eq!(outcome, RepairOutcome::default());
    }

    #[test]
    fn bowtie_is_split_into_valid_parts() {
        let fc = collection(&[Shape::Polygon(bowtie()), Shape::Polygon(square(5., 5., 1.))]);
        assert_eq!(count_invalid(&fc).unwrap(), 1);

        let (repaired, outcome) = repair(&fc, &RepairOptions::repair_only()).unwrap();
        assert_eq!(outcome.repaired, 1);
        assert_eq!(count_invalid(&repaired).unwrap(), 0);

        let shape = repaired.shape(0).unwrap();
        assert!((shape.area() - 2.0).abs() < 1e-6, "area {}", shape.area());
        assert_eq!(repaired.as_value()["features"][1], fc.as_value()["features"][1]);
    }

    #[test]
    fn overlapping_parts_are_merged() {
        let fc = collection(&[Shape::MultiPolygon(MultiPolygon(vec![square(0., 0., 2.), square(1., 1., 2.)]))]);
        let (repaired, outcome) = repair(&fc, &RepairOptions::repair_only()).unwrap();
        assert_eq!(outcome.repaired, 1);
        assert_eq!(count_invalid(&repaired).unwrap(), 0);
        assert!((repaired.shape(0).unwrap().area() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn small_parts_are_dropped() {
        let fc = collection(&[Shape::MultiPolygon(MultiPolygon(vec![
            square(0., 0., 10.),
            square(20., 20., 1.),
            square(30., 30., 2.),
        ]))]);
        let options = RepairOptions { min_area: 10.0, skip_validation: false };
        let (repaired, outcome) = repair(&fc, &options).unwrap();
        assert_eq!(outcome.dropped, 2);
        assert_eq!(repaired.shape(0).unwrap(), Shape::Polygon(square(0., 0., 10.)));
    }

    #[test]
    fn feature_is_never_emptied() {
        let fc = collection(&[Shape::MultiPolygon(MultiPolygon(vec![square(0., 0., 1.), square(5., 5., 2.)]))]);
        let options = RepairOptions { min_area: 100.0, skip_validation: false };
        let (repaired, outcome) = repair(&fc, &options).unwrap();
        // all-small parts are kept and left out of the dropped count
        assert_eq!(outcome.dropped, 0);
        assert_eq!(repaired, fc);
    }

    #[test]
    fn skip_validation_only_filters() {
        let fc = collection(&[
            Shape::Polygon(bowtie()),
            Shape::MultiPolygon(MultiPolygon(vec![square(0., 0., 10.), square(20., 20., 1.)])),
        ]);
        let options = RepairOptions { min_area: 10.0, skip_validation: true };
        let (repaired, outcome) = repair(&fc, &options).unwrap();
        assert_eq!(outcome.repaired, 0);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(repaired.as_value()["features"][0], fc.as_value()["features"][0]);
        assert_eq!(count_invalid(&repaired).unwrap(), 1);
    }

    #[test]
    fn unrecoverable_geometry_passes_through() {
        let sliver = Polygon::new(LineString::from(vec![(0., 0.), (1., 1.), (2., 2.), (0., 0.)]), vec![]);
        let fc = collection(&[Shape::Polygon(sliver)]);
        let (repaired, outcome) = repair(&fc, &RepairOptions::repair_only()).unwrap();
        assert_eq!(outcome.unrecoverable, 1);
        assert_eq!(repaired, fc);
    }

    #[test]
    fn malformed_geometry_aborts() {
        let mut value = collection(&[Shape::Polygon(square(0., 0., 1.)), Shape::Polygon(square(0., 0., 1.))])
            .as_value()
            .clone();
        value["features"][1]["geometry"] = json!({ "type": "Point", "coordinates": [0, 0] });
        let fc = FeatureCollection::from_value(value).unwrap();

        let err = repair(&fc, &RepairOptions::default()).unwrap_err();
        assert!(matches!(err, crate::Error::GeometryParse { feature: 1, .. }));
        assert!(count_invalid(&fc).is_err());
    }

    #[test]
    fn repair_file_writes_nothing_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.geojson");
        let dst = dir.path().join("in_valid.geojson");
        std::fs::write(&src, r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null}]}"#).unwrap();

        assert!(repair_file(&src, &dst, &RepairOptions::default()).is_err());
        assert!(!dst.exists());
    }
}
