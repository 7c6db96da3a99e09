//! Re-nodding: splitting every edge of a DCEL at its crossings with the
//! other polygon's boundary, so the two subdivisions meet only at vertices
//! both of them carry.

use std::iter::once;

use geo::Polygon;
use log::trace;
use rstar::RTree;

use crate::dcel::{Dcel, HalfEdgeId};
use crate::error::OverlayError;
use crate::predicates::xy_cmp;
use crate::ring::ring_segments;
use crate::seg::{SegIntersection, Segment};

/// A polygon boundary indexed for range search by segment envelope.
pub(crate) struct IndexedBoundary {
    tree: RTree<Segment>,
}

impl IndexedBoundary {
    pub(crate) fn new(poly: &Polygon<f64>) -> Self {
        let segments: Vec<Segment> = once(poly.exterior())
            .chain(poly.interiors().iter())
            .flat_map(ring_segments)
            .collect();
        Self { tree: RTree::bulk_load(segments) }
    }
}

/// Splits every edge of `dcel` at each point where `boundary` crosses it.
pub(crate) fn renode(dcel: &mut Dcel, boundary: &IndexedBoundary) -> Result<(), OverlayError> {
    let mut components: Vec<HalfEdgeId> = Vec::new();
    for face in &dcel.faces {
        components.extend(face.outer);
        components.extend(face.inners.iter().copied());
    }
    for start in components {
        renode_component(dcel, boundary, start)?;
    }
    Ok(())
}

fn renode_component(
    dcel: &mut Dcel,
    boundary: &IndexedBoundary,
    start: HalfEdgeId,
) -> Result<(), OverlayError> {
    let mut e = start;
    loop {
        let u = dcel.origin_coords(e);
        let v = dcel.dest_coords(e);
        let seg = Segment { a: u, b: v };

        // Gather cut locations along u→v.
        let mut cuts = vec![u, v];
        for other in boundary.tree.locate_in_envelope_intersecting(&seg.envelope()) {
            match seg.intersect(other) {
                SegIntersection::Empty => {}
                SegIntersection::Point(p) => cuts.push(p),
                SegIntersection::Overlap(p, q) => {
                    cuts.push(p);
                    cuts.push(q);
                }
            }
        }
        cuts.sort_by(xy_cmp);
        cuts.dedup();
        if cuts[cuts.len() - 1] == u {
            cuts.reverse();
        }
        if cuts[0] != u || cuts[cuts.len() - 1] != v {
            return Err(OverlayError::NumericDegeneracy(format!(
                "cut point outside the span of the edge ({}, {}) → ({}, {})",
                u.x, u.y, v.x, v.y
            )));
        }
        if cuts.len() > 2 {
            trace!("splitting edge ({}, {}) → ({}, {}) {} times", u.x, u.y, v.x, v.y, cuts.len() - 2);
        }

        // Perform the cuts; each split leaves `e` as the piece ending at
        // the cut and continues on the inserted remainder.
        for &cut in &cuts[1..cuts.len() - 1] {
            let vert = dcel.find_or_add_vertex(cut);
            dcel.split_edge(e, vert);
            e = dcel.half_edges[e.0].next;
        }
        e = dcel.half_edges[e.0].next;

        if e == start {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcel::Input;
    use geo::{coord, polygon};

    #[test]
    fn crossing_boundary_splits_edges() {
        let a = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 4.0),
        ];
        let b = polygon![
            (x: 2.0, y: 2.0),
            (x: 6.0, y: 2.0),
            (x: 6.0, y: 6.0),
            (x: 2.0, y: 6.0),
        ];
        let mut dcel = Dcel::from_polygon(&a, Input::A).unwrap();
        renode(&mut dcel, &IndexedBoundary::new(&b)).unwrap();
        dcel.verify().unwrap();

        // B's boundary crosses A's at (4, 2) and (2, 4).
        assert!(dcel.vertex_at(coord! { x: 4.0, y: 2.0 }).is_some());
        assert!(dcel.vertex_at(coord! { x: 2.0, y: 4.0 }).is_some());
        assert_eq!(dcel.num_vertices(), 6);
        assert_eq!(dcel.num_half_edges(), 12);
        let outer = dcel.faces[1].outer.unwrap();
        assert_eq!(dcel.face_cycle(outer).count(), 6);
    }

    #[test]
    fn disjoint_boundary_leaves_the_dcel_alone() {
        let a = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        let b = polygon![
            (x: 2.0, y: 2.0),
            (x: 3.0, y: 2.0),
            (x: 3.0, y: 3.0),
            (x: 2.0, y: 3.0),
        ];
        let mut dcel = Dcel::from_polygon(&a, Input::A).unwrap();
        renode(&mut dcel, &IndexedBoundary::new(&b)).unwrap();
        assert_eq!(dcel.num_half_edges(), 8);
        dcel.verify().unwrap();
    }

    #[test]
    fn collinear_overlap_cuts_at_overlap_endpoints() {
        let a = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 4.0),
        ];
        // Shares part of A's bottom edge.
        let b = polygon![
            (x: 1.0, y: 0.0),
            (x: 3.0, y: 0.0),
            (x: 3.0, y: -2.0),
            (x: 1.0, y: -2.0),
        ];
        let mut dcel = Dcel::from_polygon(&a, Input::A).unwrap();
        renode(&mut dcel, &IndexedBoundary::new(&b)).unwrap();
        dcel.verify().unwrap();
        assert!(dcel.vertex_at(coord! { x: 1.0, y: 0.0 }).is_some());
        assert!(dcel.vertex_at(coord! { x: 3.0, y: 0.0 }).is_some());
        assert_eq!(dcel.num_half_edges(), 12);
    }
}
