// Black-box tests for the overlay pipeline: the classic two-square and
// shared-edge configurations, holes, containment, and the subdivision
// invariants (pointer laws, cycle winding, label symmetry).

use geo::{polygon, Area, Coord, LineString, Polygon};
use planar_overlay::{overlay, FaceView, LabelledSubdivision, OverlayError, OverlayOp};

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![
        (x: x0, y: y0),
        (x: x1, y: y0),
        (x: x1, y: y1),
        (x: x0, y: y1),
    ]
}

fn face_polygon(view: &FaceView) -> Polygon<f64> {
    let outer = view.outer.as_ref().expect("bounded face");
    Polygon::new(
        LineString(outer.clone()),
        view.inners.iter().map(|ring| LineString(ring.clone())).collect(),
    )
}

fn face_area(view: &FaceView) -> f64 {
    face_polygon(view).unsigned_area()
}

fn op_area(subdivision: &LabelledSubdivision, op: OverlayOp) -> f64 {
    subdivision.select(op).iter().filter(|f| f.outer.is_some()).map(face_area).sum()
}

fn check_pointer_laws(subdivision: &LabelledSubdivision) {
    let dcel = subdivision.dcel();
    dcel.verify().unwrap();
    for i in 0..dcel.num_half_edges() {
        let he = dcel.half_edge(planar_overlay::HalfEdgeId(i));
        assert_eq!(dcel.half_edge(he.twin).twin, planar_overlay::HalfEdgeId(i));
        assert_eq!(dcel.half_edge(he.next).prev, planar_overlay::HalfEdgeId(i));
        assert_eq!(dcel.half_edge(he.prev).next, planar_overlay::HalfEdgeId(i));
    }
}

fn ring_signed_area(ring: &[Coord<f64>]) -> f64 {
    Polygon::new(LineString(ring.to_vec()), vec![]).signed_area()
}

#[test]
fn overlapping_squares() {
    let a = square(0.0, 0.0, 4.0, 4.0);
    let b = square(2.0, 2.0, 6.0, 6.0);
    let subdivision = overlay(&a, &b).unwrap();
    check_pointer_laws(&subdivision);

    let intersection = subdivision.select(OverlayOp::Intersection);
    assert_eq!(intersection.len(), 1);
    assert_eq!(face_area(&intersection[0]), 4.0);
    let outer = intersection[0].outer.as_ref().unwrap();
    for corner in [(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0)] {
        assert!(outer.contains(&Coord { x: corner.0, y: corner.1 }));
    }

    assert_eq!(op_area(&subdivision, OverlayOp::Union), 28.0);
    assert_eq!(op_area(&subdivision, OverlayOp::SymmetricDifference), 24.0);
    assert_eq!(op_area(&subdivision, OverlayOp::Difference), 12.0);
}

#[test]
fn difference_with_hole() {
    let a = polygon!(
        exterior: [
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ],
        interiors: [[
            (x: 3.0, y: 3.0),
            (x: 3.0, y: 7.0),
            (x: 7.0, y: 7.0),
            (x: 7.0, y: 3.0),
        ]],
    );
    let b = square(5.0, 5.0, 9.0, 9.0);
    let subdivision = overlay(&a, &b).unwrap();
    check_pointer_laws(&subdivision);

    assert_eq!(op_area(&subdivision, OverlayOp::Difference), 72.0);
    assert_eq!(op_area(&subdivision, OverlayOp::Intersection), 12.0);
    assert_eq!(op_area(&subdivision, OverlayOp::Union), 88.0);
}

#[test]
fn triangles_sharing_an_edge() {
    let a = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 1.0, y: 2.0)];
    let b = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 1.0, y: -2.0)];
    let subdivision = overlay(&a, &b).unwrap();
    check_pointer_laws(&subdivision);

    // The shared edge has zero area; the coincident half-edge pairs must
    // have been deduplicated rather than producing sliver cycles.
    assert!(subdivision.select(OverlayOp::Intersection).is_empty());
    assert_eq!(op_area(&subdivision, OverlayOp::Union), 4.0);
    assert_eq!(subdivision.faces().len(), 3);
}

#[test]
fn disjoint_squares() {
    let a = square(0.0, 0.0, 1.0, 1.0);
    let b = square(2.0, 2.0, 3.0, 3.0);
    let subdivision = overlay(&a, &b).unwrap();
    check_pointer_laws(&subdivision);

    assert!(subdivision.select(OverlayOp::Intersection).is_empty());

    let faces = subdivision.faces();
    assert_eq!(faces.len(), 3);
    let unbounded: Vec<_> = faces.iter().filter(|f| f.outer.is_none()).collect();
    assert_eq!(unbounded.len(), 1);
    assert!(!unbounded[0].label_a && !unbounded[0].label_b);
    assert_eq!(unbounded[0].inners.len(), 2);

    let union = subdivision.select(OverlayOp::Union);
    assert_eq!(union.len(), 2);
    let mut labels: Vec<(bool, bool)> =
        union.iter().map(|f| (f.label_a, f.label_b)).collect();
    labels.sort();
    assert_eq!(labels, vec![(false, true), (true, false)]);
    for face in &union {
        assert_eq!(face_area(face), 1.0);
    }
}

#[test]
fn contained_square() {
    // B strictly inside A: B's face must still learn it is covered by A
    // even though the boundaries never touch.
    let a = square(0.0, 0.0, 10.0, 10.0);
    let b = square(4.0, 4.0, 6.0, 6.0);
    let subdivision = overlay(&a, &b).unwrap();
    check_pointer_laws(&subdivision);

    let intersection = subdivision.select(OverlayOp::Intersection);
    assert_eq!(intersection.len(), 1);
    assert_eq!(face_area(&intersection[0]), 4.0);

    // A minus B is the annulus: one face, one hole, area 96.
    let difference = subdivision.select(OverlayOp::Difference);
    assert_eq!(difference.len(), 1);
    assert_eq!(difference[0].inners.len(), 1);
    assert_eq!(face_area(&difference[0]), 96.0);

    assert_eq!(op_area(&subdivision, OverlayOp::Union), 100.0);
}

#[test]
fn self_overlay_reconstructs_the_input() {
    let a = square(0.0, 0.0, 5.0, 5.0);
    let subdivision = overlay(&a, &a).unwrap();
    check_pointer_laws(&subdivision);

    let intersection = subdivision.select(OverlayOp::Intersection);
    assert_eq!(intersection.len(), 1);
    assert_eq!(face_area(&intersection[0]), 25.0);
    assert_eq!(op_area(&subdivision, OverlayOp::Union), 25.0);
    assert!(subdivision.select(OverlayOp::SymmetricDifference).is_empty());
}

#[test]
fn swapping_inputs_swaps_labels() {
    let a = square(0.0, 0.0, 4.0, 4.0);
    let b = square(2.0, 2.0, 6.0, 6.0);
    let ab = overlay(&a, &b).unwrap();
    let ba = overlay(&b, &a).unwrap();

    let mut ab_faces: Vec<(u64, bool, bool)> = ab
        .faces()
        .iter()
        .filter(|f| f.outer.is_some())
        .map(|f| (face_area(f).to_bits(), f.label_a, f.label_b))
        .collect();
    let mut ba_faces: Vec<(u64, bool, bool)> = ba
        .faces()
        .iter()
        .filter(|f| f.outer.is_some())
        .map(|f| (face_area(f).to_bits(), f.label_b, f.label_a))
        .collect();
    ab_faces.sort();
    ba_faces.sort();
    assert_eq!(ab_faces, ba_faces);
}

#[test]
fn cycles_are_wound_outer_ccw_inner_cw() {
    let a = polygon!(
        exterior: [
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ],
        interiors: [[
            (x: 3.0, y: 3.0),
            (x: 3.0, y: 7.0),
            (x: 7.0, y: 7.0),
            (x: 7.0, y: 3.0),
        ]],
    );
    let b = square(5.0, 5.0, 9.0, 9.0);
    let subdivision = overlay(&a, &b).unwrap();

    for face in subdivision.faces() {
        if let Some(outer) = &face.outer {
            assert!(ring_signed_area(outer) > 0.0, "outer cycle must be CCW");
        }
        for inner in &face.inners {
            if face.outer.is_some() {
                assert!(ring_signed_area(inner) < 0.0, "inner cycle must be CW");
            }
        }
    }
}

#[test]
fn interior_points_land_in_correctly_labelled_faces() {
    use geo::InteriorPoint;
    use planar_overlay::{point_in_ring, RingLocation};

    let a = square(0.0, 0.0, 4.0, 4.0);
    let b = square(2.0, 2.0, 6.0, 6.0);
    let subdivision = overlay(&a, &b).unwrap();

    // Sample a point inside each bounded face and recheck its labels
    // against the inputs directly.
    for face in subdivision.faces() {
        if face.outer.is_none() {
            continue;
        }
        let probe: Coord<f64> = face_polygon(&face).interior_point().unwrap().into();
        assert_eq!(
            point_in_ring(probe, a.exterior()) == RingLocation::Inside,
            face.label_a,
        );
        assert_eq!(
            point_in_ring(probe, b.exterior()) == RingLocation::Inside,
            face.label_b,
        );
    }
}

#[test]
fn rejects_invalid_input() {
    let good = square(0.0, 0.0, 1.0, 1.0);
    let repeated = polygon![
        (x: 0.0, y: 0.0),
        (x: 1.0, y: 0.0),
        (x: 1.0, y: 0.0),
        (x: 1.0, y: 1.0),
    ];
    assert!(matches!(
        overlay(&good, &repeated),
        Err(OverlayError::InvalidInput(_))
    ));
    assert!(matches!(
        overlay(&repeated, &good),
        Err(OverlayError::InvalidInput(_))
    ));
}
