//! Point-in-ring location by ray casting, plus the ring-level input checks
//! and winding canonicalisation run before DCEL construction.

use geo::{Coord, LineString, Polygon, Winding};

use crate::error::OverlayError;
use crate::seg::{SegIntersection, Segment};

/// Where a point sits relative to a closed ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingLocation {
    OnBoundary,
    Inside,
    Outside,
}

/// Locates `pt` relative to the closed ring `ring`.
///
/// Boundary containment is decided first. Otherwise a horizontal ray is
/// cast from `pt` past the ring's X extent and boundary crossings are
/// counted. A crossing at a ring vertex is attributed to the segment
/// hanging below it, so a vertex shared by two segments is never counted
/// twice; horizontal segments lying on the ray contribute only through
/// their endpoints.
pub fn point_in_ring(pt: Coord<f64>, ring: &LineString<f64>) -> RingLocation {
    let mut max_x = f64::NEG_INFINITY;
    for seg in ring_segments(ring) {
        max_x = max_x.max(seg.max_x());
        if seg.intersects_xy(pt) {
            return RingLocation::OnBoundary;
        }
    }
    if pt.x > max_x {
        return RingLocation::Outside;
    }

    let ray = Segment {
        a: pt,
        b: Coord { x: max_x + 1.0, y: pt.y },
    };
    let mut count = 0;
    for seg in ring_segments(ring) {
        match seg.intersect(&ray) {
            SegIntersection::Empty => {}
            SegIntersection::Overlap(..) => {}
            SegIntersection::Point(p) => {
                if p == seg.a || p == seg.b {
                    let other_y = if p == seg.a { seg.b.y } else { seg.a.y };
                    if other_y < pt.y {
                        count += 1;
                    }
                } else {
                    count += 1;
                }
            }
        }
    }
    if count % 2 == 1 {
        RingLocation::Inside
    } else {
        RingLocation::Outside
    }
}

/// Locates `pt` relative to a polygon's interior: inside the exterior ring
/// and outside every hole.
pub(crate) fn polygon_location(pt: Coord<f64>, poly: &Polygon<f64>) -> RingLocation {
    match point_in_ring(pt, poly.exterior()) {
        RingLocation::OnBoundary => return RingLocation::OnBoundary,
        RingLocation::Outside => return RingLocation::Outside,
        RingLocation::Inside => {}
    }
    for hole in poly.interiors() {
        match point_in_ring(pt, hole) {
            RingLocation::OnBoundary => return RingLocation::OnBoundary,
            RingLocation::Inside => return RingLocation::Outside,
            RingLocation::Outside => {}
        }
    }
    RingLocation::Inside
}

/// The directed segments of a ring, skipping zero-length entries.
pub(crate) fn ring_segments(ring: &LineString<f64>) -> impl Iterator<Item = Segment> + '_ {
    ring.0
        .windows(2)
        .filter(|w| w[0] != w[1])
        .map(|w| Segment { a: w[0], b: w[1] })
}

/// Returns a copy of `poly` with the exterior ring wound counter-clockwise
/// and every hole wound clockwise, the orientation the DCEL builder
/// assumes.
pub(crate) fn force_canonical_winding(poly: &Polygon<f64>) -> Polygon<f64> {
    let mut exterior = poly.exterior().clone();
    exterior.make_ccw_winding();
    let interiors = poly
        .interiors()
        .iter()
        .map(|ring| {
            let mut ring = ring.clone();
            ring.make_cw_winding();
            ring
        })
        .collect();
    Polygon::new(exterior, interiors)
}

/// Checks the preconditions the overlay relies on: closed rings of at
/// least three distinct vertices, finite coordinates, no repeated
/// consecutive coordinate, and hole vertices not outside the exterior.
/// Ring simplicity beyond that is the caller's contract.
pub(crate) fn validate_polygon(poly: &Polygon<f64>) -> Result<(), OverlayError> {
    validate_ring(poly.exterior(), "exterior ring")?;
    for (i, hole) in poly.interiors().iter().enumerate() {
        let what = format!("interior ring {i}");
        validate_ring(hole, &what)?;
        for &c in &hole.0 {
            if point_in_ring(c, poly.exterior()) == RingLocation::Outside {
                return Err(OverlayError::InvalidInput(format!(
                    "{what} has a vertex at ({}, {}) outside the exterior ring",
                    c.x, c.y
                )));
            }
        }
    }
    Ok(())
}

fn validate_ring(ring: &LineString<f64>, what: &str) -> Result<(), OverlayError> {
    let coords = &ring.0;
    if coords.len() < 4 {
        return Err(OverlayError::InvalidInput(format!(
            "{what} has fewer than three distinct vertices"
        )));
    }
    if coords.first() != coords.last() {
        return Err(OverlayError::InvalidInput(format!("{what} is not closed")));
    }
    for c in coords {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(OverlayError::InvalidInput(format!(
                "{what} contains a non-finite coordinate"
            )));
        }
    }
    for w in coords.windows(2) {
        if w[0] == w[1] {
            return Err(OverlayError::InvalidInput(format!(
                "{what} repeats the coordinate ({}, {})",
                w[0].x, w[0].y
            )));
        }
    }
    Ok(())
}
