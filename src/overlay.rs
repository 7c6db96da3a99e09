//! The overlay pipeline: build and re-nod a DCEL per input, merge them,
//! restore the radial invariant at shared vertices, rebuild the face list,
//! and label every face with the inputs covering it.

use std::collections::HashMap;

use geo::{Coord, Polygon};
use log::debug;

use crate::dcel::{Dcel, Face, FaceId, HalfEdge, HalfEdgeId, Input, VertexId};
use crate::error::OverlayError;
use crate::predicates::{orientation, signed_horizontal_distance, xy_less, Orientation};
use crate::renode::{renode, IndexedBoundary};
use crate::ring::{polygon_location, RingLocation};
use crate::seg::Segment;

/// The set-theoretic operations derivable from a labelled subdivision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayOp {
    Intersection,
    Union,
    /// A minus B.
    Difference,
    SymmetricDifference,
}

impl OverlayOp {
    /// Whether a face with the given labels belongs to this operation's
    /// result.
    pub fn selects(&self, a: bool, b: bool) -> bool {
        match self {
            OverlayOp::Intersection => a && b,
            OverlayOp::Union => a || b,
            OverlayOp::Difference => a && !b,
            OverlayOp::SymmetricDifference => a != b,
        }
    }
}

/// One face of a [`LabelledSubdivision`], with its boundary cycles dumped
/// to closed coordinate sequences: the outer cycle counter-clockwise
/// (absent only for the unbounded face), inner cycles clockwise.
#[derive(Clone, Debug)]
pub struct FaceView {
    pub outer: Option<Vec<Coord<f64>>>,
    pub inners: Vec<Vec<Coord<f64>>>,
    pub label_a: bool,
    pub label_b: bool,
}

/// The labelled planar subdivision produced by [`overlay`].
pub struct LabelledSubdivision {
    dcel: Dcel,
}

impl LabelledSubdivision {
    /// All faces, in arbitrary order. Exactly one has no outer cycle: the
    /// unbounded face.
    pub fn faces(&self) -> Vec<FaceView> {
        self.dcel.faces.iter().map(|f| self.view(f)).collect()
    }

    /// The faces selected by a set operation's label mask.
    pub fn select(&self, op: OverlayOp) -> Vec<FaceView> {
        self.dcel
            .faces
            .iter()
            .filter(|f| op.selects(f.label_a, f.label_b))
            .map(|f| self.view(f))
            .collect()
    }

    /// The underlying DCEL.
    pub fn dcel(&self) -> &Dcel {
        &self.dcel
    }

    fn view(&self, face: &Face) -> FaceView {
        FaceView {
            outer: face.outer.map(|start| self.cycle_coords(start)),
            inners: face.inners.iter().map(|&start| self.cycle_coords(start)).collect(),
            label_a: face.label_a,
            label_b: face.label_b,
        }
    }

    fn cycle_coords(&self, start: HalfEdgeId) -> Vec<Coord<f64>> {
        let mut coords: Vec<Coord<f64>> =
            self.dcel.face_cycle(start).map(|he| self.dcel.origin_coords(he)).collect();
        coords.push(coords[0]);
        coords
    }
}

/// Computes the planar overlay of two polygons.
///
/// The result is a subdivision of the plane whose faces are bounded by
/// pieces of the two input boundaries, each face labelled with whether it
/// lies in the interior of `a` and of `b`. The four set operations are
/// selections on those labels (see [`LabelledSubdivision::select`]).
///
/// Inputs must be valid simple polygons (see crate docs); the overlay
/// itself runs in the X/Y plane on exact IEEE-754 coordinates.
pub fn overlay(a: &Polygon<f64>, b: &Polygon<f64>) -> Result<LabelledSubdivision, OverlayError> {
    let mut dcel = Dcel::from_polygon(a, Input::A)?;
    let mut dcel_b = Dcel::from_polygon(b, Input::B)?;
    debug!(
        "built DCELs: A with {} half-edges, B with {}",
        dcel.num_half_edges(),
        dcel_b.num_half_edges()
    );

    renode(&mut dcel, &IndexedBoundary::new(b))?;
    renode(&mut dcel_b, &IndexedBoundary::new(a))?;
    debug!(
        "re-nodded: A with {} half-edges, B with {}",
        dcel.num_half_edges(),
        dcel_b.num_half_edges()
    );

    merge(&mut dcel, dcel_b)?;
    fix_radial_order(&mut dcel)?;
    reassign_faces(&mut dcel)?;
    complete_labels(&mut dcel, a, b)?;
    dcel.verify()?;
    debug!(
        "overlay done: {} vertices, {} half-edges, {} faces",
        dcel.num_vertices(),
        dcel.num_half_edges(),
        dcel.num_faces()
    );

    Ok(LabelledSubdivision { dcel })
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Merges `other` into `dcel`: vertices are unified by coordinate and
/// half-edges appended with their indices remapped. A pair that coincides
/// with an edge already present (the inputs may share boundary sections)
/// is dropped and its labels folded into the surviving pair, so the radial
/// fix never sees two edges on the same support.
fn merge(dcel: &mut Dcel, other: Dcel) -> Result<(), OverlayError> {
    let vertex_map: Vec<VertexId> =
        other.vertices.iter().map(|v| dcel.find_or_add_vertex(v.coords)).collect();

    let mut edge_at: HashMap<(VertexId, VertexId), HalfEdgeId> =
        HashMap::with_capacity(dcel.num_half_edges());
    for i in 0..dcel.num_half_edges() {
        let id = HalfEdgeId(i);
        edge_at.insert((dcel.half_edges[i].origin, dcel.dest(id)), id);
    }

    if other.num_half_edges() % 2 != 0 {
        return Err(OverlayError::InternalInvariant("odd number of half-edges".into()));
    }
    let mut dropped = 0usize;
    for pair in 0..other.num_half_edges() / 2 {
        let fwd = &other.half_edges[2 * pair];
        let rev = &other.half_edges[2 * pair + 1];
        if fwd.twin != HalfEdgeId(2 * pair + 1) || rev.twin != HalfEdgeId(2 * pair) {
            return Err(OverlayError::InternalInvariant("half-edge twins not adjacent".into()));
        }
        let u = vertex_map[fwd.origin.0];
        let v = vertex_map[rev.origin.0];

        if let Some(&existing) = edge_at.get(&(u, v)) {
            let existing_twin = dcel.half_edges[existing.0].twin;
            dcel.half_edges[existing.0].labels.absorb(fwd.labels);
            dcel.half_edges[existing_twin.0].labels.absorb(rev.labels);
            dropped += 1;
            continue;
        }

        let uv = HalfEdgeId(dcel.num_half_edges());
        let vu = HalfEdgeId(dcel.num_half_edges() + 1);
        // next/prev/face are placeholders; the radial fix and the face
        // rebuild overwrite them for every half-edge.
        dcel.half_edges.push(HalfEdge {
            origin: u,
            twin: vu,
            face: FaceId(0),
            next: uv,
            prev: uv,
            labels: fwd.labels,
        });
        dcel.half_edges.push(HalfEdge {
            origin: v,
            twin: uv,
            face: FaceId(0),
            next: vu,
            prev: vu,
            labels: rev.labels,
        });
        edge_at.insert((u, v), uv);
        edge_at.insert((v, u), vu);
    }
    if dropped > 0 {
        debug!("merge dropped {dropped} coincident edge pairs");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Radial fix
// ---------------------------------------------------------------------------

/// Restores the radial invariant at every vertex: the outgoing half-edges
/// are sorted by the angle of their direction and prev/next rewired
/// between angular neighbours, which stitches the two edge sets together
/// at shared vertices.
fn fix_radial_order(dcel: &mut Dcel) -> Result<(), OverlayError> {
    let mut outgoing: Vec<Vec<HalfEdgeId>> = vec![Vec::new(); dcel.num_vertices()];
    for i in 0..dcel.num_half_edges() {
        outgoing[dcel.half_edges[i].origin.0].push(HalfEdgeId(i));
    }

    for (v, mut incident) in outgoing.into_iter().enumerate() {
        if incident.is_empty() {
            continue;
        }
        let origin = dcel.vertices[v].coords;
        let angle = |dcel: &Dcel, id: HalfEdgeId| {
            let d = dcel.dest_coords(id) - origin;
            d.y.atan2(d.x)
        };
        incident.sort_by(|&i, &j| angle(dcel, i).total_cmp(&angle(dcel, j)));
        for w in incident.windows(2) {
            if angle(dcel, w[0]) == angle(dcel, w[1]) {
                return Err(OverlayError::NumericDegeneracy(format!(
                    "coincident edge directions at ({}, {})",
                    origin.x, origin.y
                )));
            }
        }

        let n = incident.len();
        for i in 0..n {
            let e_i = incident[i];
            let e_j = incident[(i + 1) % n];
            let e_j_twin = dcel.half_edges[e_j.0].twin;
            dcel.half_edges[e_i.0].prev = e_j_twin;
            dcel.half_edges[e_j_twin.0].next = e_i;
        }
        dcel.vertices[v].incident = Some(incident[0]);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Face reassignment
// ---------------------------------------------------------------------------

struct Cycle {
    edges: Vec<HalfEdgeId>,
    /// The cycle edge whose origin is the leftmost-then-lowest vertex.
    leftmost: HalfEdgeId,
    is_outer: bool,
}

/// Wipes the face list and rebuilds it from the boundary cycles: each
/// cycle is classified outer or inner by the turn at its leftmost-then-
/// lowest vertex, inner cycles are grouped with the cycle that contains
/// them, and each group becomes one face.
fn reassign_faces(dcel: &mut Dcel) -> Result<(), OverlayError> {
    let num_edges = dcel.num_half_edges();
    let mut cycle_of = vec![usize::MAX; num_edges];
    let mut cycles: Vec<Cycle> = Vec::new();

    for start in 0..num_edges {
        if cycle_of[start] != usize::MAX {
            continue;
        }
        let index = cycles.len();
        let mut edges = Vec::new();
        let mut e = HalfEdgeId(start);
        loop {
            if edges.len() > num_edges {
                return Err(OverlayError::InternalInvariant("next-cycle does not close".into()));
            }
            cycle_of[e.0] = index;
            edges.push(e);
            e = dcel.half_edges[e.0].next;
            if e.0 == start {
                break;
            }
        }

        let mut leftmost = edges[0];
        for &e in &edges[1..] {
            if xy_less(dcel.origin_coords(e), dcel.origin_coords(leftmost)) {
                leftmost = e;
            }
        }
        // Outer components are wound CCW, inner components CW, so the turn
        // at the extreme vertex separates the two.
        let prev = dcel.half_edges[leftmost.0].prev;
        let here = dcel.origin_coords(leftmost);
        let is_outer = orientation(dcel.origin_coords(prev), here, dcel.dest_coords(leftmost))
            == Orientation::LeftTurn;
        cycles.push(Cycle { edges, leftmost, is_outer });
    }

    // Group cycles belonging to one face. Element 0 stands for the absent
    // outer component of the unbounded face; cycle i is element i + 1.
    let mut groups = UnionFind::new(cycles.len() + 1);
    for (i, cycle) in cycles.iter().enumerate() {
        if cycle.is_outer {
            continue;
        }
        let p = dcel.origin_coords(cycle.leftmost);
        match nearest_edge_left_of(dcel, p) {
            Some(edge) => groups.union(i + 1, cycle_of[edge.0] + 1),
            None => groups.union(i + 1, 0),
        }
    }

    dcel.faces.clear();
    let unbounded = FaceId(0);
    dcel.faces.push(Face::default());
    let mut face_of_root: HashMap<usize, FaceId> = HashMap::new();
    face_of_root.insert(groups.find(0), unbounded);

    for (i, cycle) in cycles.iter().enumerate() {
        let root = groups.find(i + 1);
        let face = *face_of_root.entry(root).or_insert_with(|| {
            let id = FaceId(dcel.faces.len());
            dcel.faces.push(Face::default());
            id
        });
        if cycle.is_outer {
            if face == unbounded || dcel.faces[face.0].outer.is_some() {
                return Err(OverlayError::InternalInvariant(
                    "face grouped with two outer components".into(),
                ));
            }
            dcel.faces[face.0].outer = Some(cycle.leftmost);
        } else {
            dcel.faces[face.0].inners.push(cycle.leftmost);
        }
        for &e in &cycle.edges {
            dcel.half_edges[e.0].face = face;
        }
    }
    Ok(())
}

/// The half-edge nearest to the left of `p` among edges running downward
/// past `p`'s Y. Near-horizontal candidates are skipped: their crossing X
/// is ill-conditioned and cannot decide containment.
fn nearest_edge_left_of(dcel: &Dcel, p: Coord<f64>) -> Option<HalfEdgeId> {
    let mut best: Option<(HalfEdgeId, f64)> = None;
    for i in 0..dcel.num_half_edges() {
        let id = HalfEdgeId(i);
        let origin = dcel.origin_coords(id);
        let dest = dcel.dest_coords(id);
        if !(dest.y <= p.y && p.y <= origin.y) {
            continue;
        }
        let dy = (origin.y - dest.y).abs();
        if dy != 0.0 && dy < 1e-12 * origin.y.abs().max(dest.y.abs()) {
            continue;
        }
        let dist = signed_horizontal_distance(p, &Segment { a: origin, b: dest });
        if dist <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, best_dist)| dist < best_dist) {
            best = Some((id, dist));
        }
    }
    best.map(|(id, _)| id)
}

// ---------------------------------------------------------------------------
// Labelling
// ---------------------------------------------------------------------------

/// Labels every face. Bits carried by the face's own boundary edges win;
/// a face whose boundary never touches one input's boundary is located
/// against that input directly, using the midpoint of a boundary edge the
/// other input contributed: crossing an edge that is not part of an
/// input's boundary cannot change containment in that input, so the
/// midpoint is interior-equivalent to the face.
fn complete_labels(
    dcel: &mut Dcel,
    poly_a: &Polygon<f64>,
    poly_b: &Polygon<f64>,
) -> Result<(), OverlayError> {
    for face_idx in 0..dcel.num_faces() {
        let face = FaceId(face_idx);
        let starts: Vec<HalfEdgeId> = {
            let f = &dcel.faces[face_idx];
            f.outer.iter().chain(f.inners.iter()).copied().collect()
        };
        let edges: Vec<HalfEdgeId> =
            starts.iter().flat_map(|&s| dcel.face_cycle(s).collect::<Vec<_>>()).collect();

        let label_a = face_label(dcel, face, &edges, Input::A, poly_a)?;
        let label_b = face_label(dcel, face, &edges, Input::B, poly_b)?;
        dcel.faces[face_idx].label_a = label_a;
        dcel.faces[face_idx].label_b = label_b;
    }
    Ok(())
}

fn face_label(
    dcel: &Dcel,
    face: FaceId,
    edges: &[HalfEdgeId],
    input: Input,
    poly: &Polygon<f64>,
) -> Result<bool, OverlayError> {
    let mut saw_inside = false;
    let mut saw_outside = false;
    for &e in edges {
        match dcel.half_edges[e.0].labels.bit(input) {
            Some(true) => saw_inside = true,
            Some(false) => saw_outside = true,
            None => {}
        }
    }
    if saw_inside && saw_outside {
        return Err(OverlayError::InternalInvariant(format!(
            "face {face} carries contradictory labels"
        )));
    }
    if saw_inside || saw_outside {
        return Ok(saw_inside);
    }

    // No boundary contact with this input at all. The unbounded face lies
    // outside everything; any other face is located by an edge midpoint.
    if dcel.faces[face.0].outer.is_none() {
        return Ok(false);
    }
    for &e in edges {
        let mid = Segment { a: dcel.origin_coords(e), b: dcel.dest_coords(e) }.midpoint();
        match polygon_location(mid, poly) {
            RingLocation::Inside => return Ok(true),
            RingLocation::Outside => return Ok(false),
            RingLocation::OnBoundary => continue,
        }
    }
    Err(OverlayError::NumericDegeneracy(format!(
        "no boundary midpoint of face {face} can be located against an input"
    )))
}

// ---------------------------------------------------------------------------
// Union-find
// ---------------------------------------------------------------------------

/// Disjoint sets over cycle indices, with path compression.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            let root = self.find(self.parent[x]);
            self.parent[x] = root;
        }
        self.parent[x]
    }

    fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            self.parent[root_y] = root_x;
        }
    }
}
