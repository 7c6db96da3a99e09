//! Line segments and the closed-form segment–segment intersection that
//! re-nodding and point location are built on.

use geo::Coord;
use rstar::{RTreeObject, AABB};

use crate::error::OverlayError;
use crate::predicates::{on_segment, orientation, xy_cmp, xy_less, Orientation};

/// A line segment between two distinct coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: Coord<f64>,
    pub b: Coord<f64>,
}

/// Result of intersecting two segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SegIntersection {
    /// The segments share no point.
    Empty,
    /// The segments cross or touch at a single point.
    Point(Coord<f64>),
    /// The segments are collinear and share the closed sub-segment between
    /// the two coordinates, which are in lexicographic order.
    Overlap(Coord<f64>, Coord<f64>),
}

impl Segment {
    /// Creates a segment, rejecting coincident endpoints.
    pub fn new(a: Coord<f64>, b: Coord<f64>) -> Result<Self, OverlayError> {
        if a == b {
            return Err(OverlayError::InvalidInput(format!(
                "segment endpoints coincide at ({}, {})",
                a.x, a.y
            )));
        }
        Ok(Self { a, b })
    }

    /// The same segment with its endpoints swapped.
    pub fn reverse(&self) -> Self {
        Self { a: self.b, b: self.a }
    }

    pub fn length(&self) -> f64 {
        (self.b.x - self.a.x).hypot(self.b.y - self.a.y)
    }

    pub fn midpoint(&self) -> Coord<f64> {
        Coord {
            x: 0.5 * (self.a.x + self.b.x),
            y: 0.5 * (self.a.y + self.b.y),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.a.x.min(self.b.x)
    }

    pub fn max_x(&self) -> f64 {
        self.a.x.max(self.b.x)
    }

    /// True iff `xy` lies on this segment.
    pub fn intersects_xy(&self, xy: Coord<f64>) -> bool {
        orientation(self.a, self.b, xy) == Orientation::Collinear && on_segment(self.a, self.b, xy)
    }

    pub fn has_endpoint(&self, xy: Coord<f64>) -> bool {
        self.a == xy || self.b == xy
    }

    /// Axis-aligned envelope of the segment.
    pub fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners(
            [self.min_x(), self.a.y.min(self.b.y)],
            [self.max_x(), self.a.y.max(self.b.y)],
        )
    }

    /// Intersects two segments without allocating.
    ///
    /// The computation runs on a canonical ordering of the segments and
    /// their endpoints, so the result is bitwise identical regardless of
    /// argument order or endpoint direction. Re-nodding relies on this:
    /// both inputs must derive the same cut coordinates for a crossing, or
    /// the merged DCELs would disagree about their shared vertices.
    pub fn intersect(&self, other: &Segment) -> SegIntersection {
        let s = self.ordered();
        let t = other.ordered();
        if xy_less(t.a, s.a) || (t.a == s.a && xy_less(t.b, s.b)) {
            intersect_ordered(t, s)
        } else {
            intersect_ordered(s, t)
        }
    }

    fn ordered(&self) -> Self {
        if xy_less(self.b, self.a) {
            self.reverse()
        } else {
            *self
        }
    }
}

impl RTreeObject for Segment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        Segment::envelope(self)
    }
}

fn intersect_ordered(l1: Segment, l2: Segment) -> SegIntersection {
    let (a, b) = (l1.a, l1.b);
    let (c, d) = (l2.a, l2.b);

    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    if o1 != o2 && o3 != o4 {
        // Proper crossing. A collinear endpoint, if any, is the crossing
        // itself and is returned exactly.
        if o1 == Orientation::Collinear {
            return SegIntersection::Point(c);
        }
        if o2 == Orientation::Collinear {
            return SegIntersection::Point(d);
        }
        if o3 == Orientation::Collinear {
            return SegIntersection::Point(a);
        }
        if o4 == Orientation::Collinear {
            return SegIntersection::Point(b);
        }

        let e = (c.y - d.y) * (a.x - c.x) + (d.x - c.x) * (a.y - c.y);
        let f = (d.x - c.x) * (a.y - b.y) - (a.x - b.x) * (d.y - c.y);
        // The segments are not parallel in this branch, so f is nonzero.
        let t = e / f;
        return SegIntersection::Point(Coord {
            x: a.x + t * (b.x - a.x),
            y: a.y + t * (b.y - a.y),
        });
    }

    if o1 == Orientation::Collinear && o2 == Orientation::Collinear {
        // All four endpoints on one line: the intersection is the middle
        // two of the four under lexicographic order, unless the segments
        // are disjoint.
        if !on_segment(a, b, c) && !on_segment(a, b, d) && !on_segment(c, d, a) && !on_segment(c, d, b)
        {
            return SegIntersection::Empty;
        }
        let mut pts = [a, b, c, d];
        pts.sort_by(xy_cmp);
        if pts[1] == pts[2] {
            SegIntersection::Point(pts[1])
        } else {
            SegIntersection::Overlap(pts[1], pts[2])
        }
    } else {
        SegIntersection::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment {
        Segment {
            a: coord! { x: ax, y: ay },
            b: coord! { x: bx, y: by },
        }
    }

    #[test]
    fn rejects_degenerate_segment() {
        let c = coord! { x: 1.0, y: 1.0 };
        assert!(matches!(Segment::new(c, c), Err(OverlayError::InvalidInput(_))));
    }

    #[test]
    fn proper_crossing() {
        let got = seg(0.0, 0.0, 2.0, 2.0).intersect(&seg(0.0, 2.0, 2.0, 0.0));
        assert_eq!(got, SegIntersection::Point(coord! { x: 1.0, y: 1.0 }));
    }

    #[test]
    fn collinear_overlap() {
        let got = seg(0.0, 0.0, 2.0, 0.0).intersect(&seg(1.0, 0.0, 3.0, 0.0));
        assert_eq!(
            got,
            SegIntersection::Overlap(coord! { x: 1.0, y: 0.0 }, coord! { x: 2.0, y: 0.0 })
        );
    }

    #[test]
    fn collinear_disjoint() {
        let got = seg(0.0, 0.0, 1.0, 1.0).intersect(&seg(2.0, 2.0, 3.0, 3.0));
        assert_eq!(got, SegIntersection::Empty);
    }

    #[test]
    fn collinear_containment() {
        let got = seg(0.0, 0.0, 4.0, 0.0).intersect(&seg(1.0, 0.0, 2.0, 0.0));
        assert_eq!(
            got,
            SegIntersection::Overlap(coord! { x: 1.0, y: 0.0 }, coord! { x: 2.0, y: 0.0 })
        );
    }

    #[test]
    fn collinear_endpoint_touch_is_a_point() {
        let got = seg(0.0, 0.0, 1.0, 0.0).intersect(&seg(1.0, 0.0, 2.0, 0.0));
        assert_eq!(got, SegIntersection::Point(coord! { x: 1.0, y: 0.0 }));
    }

    #[test]
    fn endpoint_on_interior_is_a_point() {
        // T-shape: one segment ends on the interior of the other.
        let got = seg(0.0, 0.0, 2.0, 0.0).intersect(&seg(1.0, 0.0, 1.0, 2.0));
        assert_eq!(got, SegIntersection::Point(coord! { x: 1.0, y: 0.0 }));
    }

    #[test]
    fn parallel_segments_are_empty() {
        let got = seg(0.0, 0.0, 2.0, 0.0).intersect(&seg(0.0, 1.0, 2.0, 1.0));
        assert_eq!(got, SegIntersection::Empty);
    }

    #[test]
    fn intersection_commutes_bitwise() {
        let cases = [
            (seg(0.0, 0.0, 2.0, 2.0), seg(0.0, 2.0, 2.0, 0.0)),
            (seg(0.1, 0.3, 4.7, 1.9), seg(0.2, 2.8, 3.9, -1.1)),
            (seg(0.0, 0.0, 2.0, 0.0), seg(1.0, 0.0, 3.0, 0.0)),
        ];
        for (s, t) in cases {
            assert_eq!(s.intersect(&t), t.intersect(&s));
            // Direction of either segment must not matter either.
            assert_eq!(s.intersect(&t), s.reverse().intersect(&t.reverse()));
        }
    }

    #[test]
    fn envelope_and_measures() {
        let s = seg(3.0, 4.0, 0.0, 0.0);
        assert_eq!(s.length(), 5.0);
        assert_eq!(s.midpoint(), coord! { x: 1.5, y: 2.0 });
        assert_eq!(s.min_x(), 0.0);
        assert_eq!(s.max_x(), 3.0);
        assert!(s.intersects_xy(coord! { x: 1.5, y: 2.0 }));
        assert!(!s.intersects_xy(coord! { x: 1.0, y: 2.0 }));
        assert!(s.has_endpoint(coord! { x: 3.0, y: 4.0 }));
    }
}
