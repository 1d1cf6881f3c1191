//! Validity and simplicity checks for polygonal shapes.
//!
//! A shape is valid when every ring is finite, has at least three distinct
//! vertices and never touches itself, rings of different parts or holes only
//! meet at isolated points, holes lie within their shell, and no part's
//! interior overlaps another's.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::line_intersection::{line_intersection, LineIntersection};
use geo::{BoundingRect, Intersects, Line, LineString, Polygon};
use rstar::{RTree, RTreeObject};

use crate::geom::{dedup_coords, rings, segments::Segment};
use crate::io::Shape;

/// First reason a shape failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidity {
    NonFinite,
    TooFewPoints,
    SelfIntersection,
    RingCrossing,
    HoleOutsideShell,
    OverlappingParts,
}

/// Whether the shape is valid and simple.
#[inline]
pub fn is_valid_shape(shape: &Shape) -> bool {
    check_shape(shape).is_none()
}

/// Return the first validity problem found, or `None` for a valid shape.
pub fn check_shape(shape: &Shape) -> Option<Invalidity> {
    let parts = shape.parts();

    for ring in parts.iter().flat_map(rings) {
        if let Some(issue) = check_ring(ring) { return Some(issue) }
    }
    if let Some(issue) = check_crossings(parts) { return Some(issue) }
    if !parts.iter().all(holes_inside_shell) { return Some(Invalidity::HoleOutsideShell) }
    if parts_overlap(parts) { return Some(Invalidity::OverlappingParts) }

    None
}

fn check_ring(ring: &LineString<f64>) -> Option<Invalidity> {
    if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Some(Invalidity::NonFinite);
    }
    // Closed ring: three distinct vertices plus the closing one.
    if dedup_coords(ring.coords().copied()).len() < 4 {
        return Some(Invalidity::TooFewPoints);
    }
    None
}

/// Look for intersecting segments, within one ring or between rings.
fn check_crossings(parts: &[Polygon<f64>]) -> Option<Invalidity> {
    let mut segments = Vec::new();
    for (ring_id, ring) in parts.iter().flat_map(rings).enumerate() {
        let coords = dedup_coords(ring.coords().copied());
        let ring_len = coords.len().saturating_sub(1);
        segments.extend(coords.windows(2).enumerate()
            .map(|(pos, w)| Segment::new(ring_id, pos, ring_len, Line::new(w[0], w[1]))));
    }

    let tree = RTree::bulk_load(segments.clone());
    for a in &segments {
        for b in tree.locate_in_envelope_intersecting(&a.envelope()) {
            if b.key() <= a.key() { continue }
            let Some(hit) = line_intersection(a.line(), b.line()) else { continue };

            if a.ring() == b.ring() {
                // Neighbouring segments meet at their shared vertex; anything else is a self-touch.
                let shared_vertex = matches!(hit, LineIntersection::SinglePoint { .. }) && a.is_adjacent(b);
                if !shared_vertex { return Some(Invalidity::SelfIntersection) }
            } else if matches!(hit,
                LineIntersection::Collinear { .. } | LineIntersection::SinglePoint { is_proper: true, .. })
            {
                return Some(Invalidity::RingCrossing);
            }
        }
    }
    None
}

fn holes_inside_shell(polygon: &Polygon<f64>) -> bool {
    if polygon.interiors().is_empty() { return true }
    let shell = Polygon::new(polygon.exterior().clone(), vec![]);
    polygon.interiors().iter()
        .all(|hole| hole.coords().all(|c| shell.coordinate_position(c) != CoordPos::Outside))
}

/// Rings never cross at this point, so two parts overlap iff a vertex of one is inside the other.
fn parts_overlap(parts: &[Polygon<f64>]) -> bool {
    let inside = |outer: &Polygon<f64>, inner: &Polygon<f64>| {
        inner.exterior().coords().any(|c| outer.coordinate_position(c) == CoordPos::Inside)
    };

    parts.iter().enumerate().any(|(i, a)| {
        parts[i + 1..].iter().any(|b| {
            let near = match (a.bounding_rect(), b.bounding_rect()) {
                (Some(ra), Some(rb)) => ra.intersects(&rb),
                _ => false,
            };
            near && (inside(a, b) || inside(b, a))
        })
    })
}
