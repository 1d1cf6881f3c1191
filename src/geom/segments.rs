use geo::Line;
use rstar::{RTreeObject, AABB};

/// A ring segment in an R-tree, tagged with the ring it belongs to and its position in that ring.
#[derive(Debug, Clone, Copy)]
pub(super) struct Segment {
    ring: usize,     // Index of the ring across all parts of the shape
    pos: usize,      // Position of the segment within its ring
    ring_len: usize, // Number of segments in the ring
    line: Line<f64>,
}

impl Segment {
    pub(super) fn new(ring: usize, pos: usize, ring_len: usize, line: Line<f64>) -> Self {
        Self { ring, pos, ring_len, line }
    }

    #[inline] pub(super) fn ring(&self) -> usize { self.ring }

    #[inline] pub(super) fn line(&self) -> Line<f64> { self.line }

    /// Ordering key; each unordered pair of segments is visited once by comparing keys.
    #[inline] pub(super) fn key(&self) -> (usize, usize) { (self.ring, self.pos) }

    /// Whether two segments of the same ring share an endpoint by construction.
    pub(super) fn is_adjacent(&self, other: &Segment) -> bool {
        if self.ring != other.ring { return false }
        let (lo, hi) = if self.pos < other.pos { (self.pos, other.pos) } else { (other.pos, self.pos) };
        hi - lo == 1 || (lo == 0 && hi + 1 == self.ring_len)
    }
}

impl RTreeObject for Segment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.line.start.into(), self.line.end.into())
    }
}
