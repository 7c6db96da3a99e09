//! The doubly connected edge list backing the overlay.
//!
//! Every undirected edge is a pair of directed **half-edges** (twins). Each
//! half-edge carries its origin vertex, its twin, the face on its left, and
//! the next and prev half-edges around that face. The structure owns all
//! records in flat `Vec` arenas addressed by strongly-typed index wrappers
//! (`VertexId`, `HalfEdgeId`, `FaceId`), so cross-references are plain
//! indices and merging two DCELs is an index remap.
//!
//! Pointer laws, maintained by every mutation here:
//!
//! * `twin.twin == self` and `twin.origin` is the half-edge's destination
//! * `next.prev == self` and `prev.next == self`
//! * walking `next` from any half-edge returns to it in finitely many steps
//! * every half-edge on a cycle has the same incident face

use std::collections::HashMap;
use std::fmt;
use std::iter::once;

use geo::{Coord, LineString, Polygon};

use crate::error::OverlayError;
use crate::ring::{force_canonical_winding, ring_segments, validate_polygon};

// ---------------------------------------------------------------------------
// Index types
// ---------------------------------------------------------------------------

macro_rules! idx {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

idx!(VertexId);
idx!(HalfEdgeId);
idx!(FaceId);

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Which input polygon a DCEL was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    A,
    B,
}

/// Per-input interior flags carried by every half-edge through the merge.
///
/// `Some(true)` records that the input's interior lies on the half-edge's
/// incident side; `None` means the half-edge knows nothing about that
/// input because it came from the other one. Coincident half-edges merge
/// their knowledge when the edge sets are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdgeLabels {
    pub a: Option<bool>,
    pub b: Option<bool>,
}

impl EdgeLabels {
    pub(crate) fn from_input(input: Input, inside: bool) -> Self {
        match input {
            Input::A => Self { a: Some(inside), b: None },
            Input::B => Self { a: None, b: Some(inside) },
        }
    }

    /// Combines the knowledge of a coincident half-edge.
    pub(crate) fn absorb(&mut self, other: EdgeLabels) {
        self.a = merge_bit(self.a, other.a);
        self.b = merge_bit(self.b, other.b);
    }

    pub(crate) fn bit(&self, input: Input) -> Option<bool> {
        match input {
            Input::A => self.a,
            Input::B => self.b,
        }
    }
}

fn merge_bit(ours: Option<bool>, theirs: Option<bool>) -> Option<bool> {
    match (ours, theirs) {
        (Some(x), Some(y)) => Some(x || y),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A vertex and one incident half-edge whose origin is this vertex.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub coords: Coord<f64>,
    /// Any half-edge leaving this vertex. `None` only transiently, before
    /// the vertex is wired into a ring.
    pub incident: Option<HalfEdgeId>,
}

/// A directed half-edge.
#[derive(Clone, Debug)]
pub struct HalfEdge {
    /// Vertex this half-edge leaves from.
    pub origin: VertexId,
    /// The other half-edge of the same undirected edge.
    pub twin: HalfEdgeId,
    /// Face on the left of this half-edge.
    pub face: FaceId,
    /// Next half-edge around `face`.
    pub next: HalfEdgeId,
    /// Previous half-edge around `face`.
    pub prev: HalfEdgeId,
    /// Interior flags carried from the input this edge was built from.
    pub labels: EdgeLabels,
}

/// A face of the subdivision.
#[derive(Clone, Debug, Default)]
pub struct Face {
    /// A half-edge on the outer boundary cycle. `None` for the unbounded
    /// face only.
    pub outer: Option<HalfEdgeId>,
    /// One half-edge per hole cycle touching this face.
    pub inners: Vec<HalfEdgeId>,
    /// True iff the face lies in the interior of input A.
    pub label_a: bool,
    /// True iff the face lies in the interior of input B.
    pub label_b: bool,
}

// ---------------------------------------------------------------------------
// Coordinate key
// ---------------------------------------------------------------------------

/// Hash key with bitwise coordinate equality (negative zero normalised so
/// `-0.0` and `0.0` collide).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct XyKey(u64, u64);

impl XyKey {
    pub(crate) fn of(c: Coord<f64>) -> Self {
        let norm = |v: f64| if v == 0.0 { 0.0_f64 } else { v };
        Self(norm(c.x).to_bits(), norm(c.y).to_bits())
    }
}

// ---------------------------------------------------------------------------
// DCEL
// ---------------------------------------------------------------------------

/// A doubly connected edge list over `f64` coordinates.
#[derive(Clone, Debug, Default)]
pub struct Dcel {
    pub vertices: Vec<Vertex>,
    pub half_edges: Vec<HalfEdge>,
    pub faces: Vec<Face>,
    /// Vertex lookup by coordinate, kept in sync with `vertices`.
    pub(crate) vertex_index: HashMap<XyKey, VertexId>,
}

impl Dcel {
    // -----------------------------------------------------------------------
    // Counts and accessors
    // -----------------------------------------------------------------------

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_half_edges(&self) -> usize {
        self.half_edges.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    pub fn half_edge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.half_edges[id.0]
    }

    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.0]
    }

    /// The vertex at the head (destination) of a half-edge.
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.half_edges[self.half_edges[he.0].twin.0].origin
    }

    /// Origin coordinates of a half-edge.
    pub fn origin_coords(&self, he: HalfEdgeId) -> Coord<f64> {
        self.vertices[self.half_edges[he.0].origin.0].coords
    }

    /// Destination coordinates of a half-edge.
    pub fn dest_coords(&self, he: HalfEdgeId) -> Coord<f64> {
        self.vertices[self.dest(he).0].coords
    }

    /// Iterates over the half-edges of the boundary cycle through `start`,
    /// following `next`, beginning at `start`.
    pub fn face_cycle(&self, start: HalfEdgeId) -> FaceCycle<'_> {
        FaceCycle { dcel: self, start, current: start, done: false }
    }

    /// The vertex at `coords`, if one exists.
    pub fn vertex_at(&self, coords: Coord<f64>) -> Option<VertexId> {
        self.vertex_index.get(&XyKey::of(coords)).copied()
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    pub(crate) fn find_or_add_vertex(&mut self, coords: Coord<f64>) -> VertexId {
        let key = XyKey::of(coords);
        if let Some(&id) = self.vertex_index.get(&key) {
            return id;
        }
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex { coords, incident: None });
        self.vertex_index.insert(key, id);
        id
    }

    fn add_face(&mut self) -> FaceId {
        let id = FaceId(self.faces.len());
        self.faces.push(Face::default());
        id
    }

    /// Sets `he.next = next` and `next.prev = he`.
    fn set_next(&mut self, he: HalfEdgeId, next: HalfEdgeId) {
        self.half_edges[he.0].next = next;
        self.half_edges[next.0].prev = he;
    }

    // -----------------------------------------------------------------------
    // Construction from one polygon
    // -----------------------------------------------------------------------

    /// Builds the DCEL of a single polygon whose interior belongs to
    /// `input`.
    ///
    /// The exterior ring is forced counter-clockwise and holes clockwise
    /// first, which puts the polygon's interior on the left of every
    /// directed ring segment. The result has one unbounded face, one
    /// polygon face, and one face per hole; every half-edge carries the
    /// input's interior flag for its side.
    pub fn from_polygon(poly: &Polygon<f64>, input: Input) -> Result<Dcel, OverlayError> {
        validate_polygon(poly)?;
        let poly = force_canonical_winding(poly);

        let mut dcel = Dcel::default();

        let rings: Vec<&LineString<f64>> =
            once(poly.exterior()).chain(poly.interiors().iter()).collect();

        for ring in &rings {
            for &c in &ring.0 {
                dcel.find_or_add_vertex(c);
            }
        }

        let unbounded = dcel.add_face();
        let polygon_face = dcel.add_face();
        match input {
            Input::A => dcel.faces[polygon_face.0].label_a = true,
            Input::B => dcel.faces[polygon_face.0].label_b = true,
        }

        for (ring_idx, ring) in rings.iter().enumerate() {
            // For holes the right-hand side is a hole face rather than the
            // unbounded face.
            let hole_face = if ring_idx > 0 { Some(dcel.add_face()) } else { None };
            let exterior_face = hole_face.unwrap_or(unbounded);

            let first = dcel.half_edges.len();
            for seg in ring_segments(ring) {
                let u = dcel
                    .vertex_at(seg.a)
                    .ok_or_else(|| OverlayError::InternalInvariant("ring vertex missing".into()))?;
                let v = dcel
                    .vertex_at(seg.b)
                    .ok_or_else(|| OverlayError::InternalInvariant("ring vertex missing".into()))?;
                let interior = HalfEdgeId(dcel.half_edges.len());
                let exterior = HalfEdgeId(dcel.half_edges.len() + 1);
                dcel.half_edges.push(HalfEdge {
                    origin: u,
                    twin: exterior,
                    face: polygon_face,
                    next: interior,
                    prev: interior,
                    labels: EdgeLabels::from_input(input, true),
                });
                dcel.half_edges.push(HalfEdge {
                    origin: v,
                    twin: interior,
                    face: exterior_face,
                    next: exterior,
                    prev: exterior,
                    labels: EdgeLabels::from_input(input, false),
                });
                dcel.vertices[u.0].incident = Some(interior);
            }

            // The interior cycle follows the ring's winding; the exterior
            // cycle runs against it.
            let pairs = (dcel.half_edges.len() - first) / 2;
            for i in 0..pairs {
                let int_i = HalfEdgeId(first + 2 * i);
                let int_next = HalfEdgeId(first + 2 * ((i + 1) % pairs));
                let ext_i = HalfEdgeId(first + 2 * i + 1);
                let ext_next = HalfEdgeId(first + 2 * ((i + pairs - 1) % pairs) + 1);
                dcel.set_next(int_i, int_next);
                dcel.set_next(ext_i, ext_next);
            }

            let first_interior = HalfEdgeId(first);
            let first_exterior = HalfEdgeId(first + 1);
            match hole_face {
                None => {
                    dcel.faces[unbounded.0].inners.push(first_exterior);
                    if dcel.faces[polygon_face.0].outer.is_none() {
                        dcel.faces[polygon_face.0].outer = Some(first_interior);
                    }
                }
                Some(hole) => {
                    dcel.faces[polygon_face.0].inners.push(first_interior);
                    dcel.faces[hole.0].outer = Some(first_exterior);
                }
            }
        }

        Ok(dcel)
    }

    // -----------------------------------------------------------------------
    // Edge split
    // -----------------------------------------------------------------------

    /// Splits half-edge `e` and its twin at `cut`, inserting a new twin
    /// pair between `e` and its old successor. `cut` must lie strictly
    /// between the endpoints of `e`, and the vertices at either end of `e`
    /// must have degree two (the single-polygon state re-nodding operates
    /// on). All pointer laws hold again on return.
    pub(crate) fn split_edge(&mut self, e: HalfEdgeId, cut: VertexId) {
        let twin = self.half_edges[e.0].twin;
        let next = self.half_edges[e.0].next;
        let next_twin = self.half_edges[next.0].twin;
        let dest = self.half_edges[twin.0].origin;

        let e2 = HalfEdgeId(self.half_edges.len());
        let e2_twin = HalfEdgeId(self.half_edges.len() + 1);

        self.half_edges.push(HalfEdge {
            origin: cut,
            twin: e2_twin,
            face: self.half_edges[e.0].face,
            next,
            prev: e,
            labels: self.half_edges[e.0].labels,
        });
        self.half_edges.push(HalfEdge {
            origin: dest,
            twin: e2,
            face: self.half_edges[twin.0].face,
            next: twin,
            prev: next_twin,
            labels: self.half_edges[twin.0].labels,
        });

        self.half_edges[twin.0].origin = cut;
        self.half_edges[e.0].next = e2;
        self.half_edges[next.0].prev = e2;
        self.half_edges[next_twin.0].next = e2_twin;
        self.half_edges[twin.0].prev = e2_twin;
        self.vertices[cut.0].incident = Some(e2);
        self.vertices[dest.0].incident = Some(e2_twin);
    }

    // -----------------------------------------------------------------------
    // Consistency
    // -----------------------------------------------------------------------

    /// Checks the half-edge pointer laws and face incidence, reporting the
    /// first violation as an internal invariant failure.
    pub fn verify(&self) -> Result<(), OverlayError> {
        let broken = |what: &str, id: HalfEdgeId| {
            Err(OverlayError::InternalInvariant(format!("{what} at {id}")))
        };
        for i in 0..self.half_edges.len() {
            let id = HalfEdgeId(i);
            let he = &self.half_edges[i];
            if self.half_edges[he.twin.0].twin != id {
                return broken("twin.twin != self", id);
            }
            if self.half_edges[he.next.0].prev != id {
                return broken("next.prev != self", id);
            }
            if self.half_edges[he.prev.0].next != id {
                return broken("prev.next != self", id);
            }
            if self.half_edges[he.next.0].origin != self.dest(id) {
                return broken("next does not start at destination", id);
            }
            if self.half_edges[he.next.0].face != he.face {
                return broken("face changes along cycle", id);
            }
        }
        for (i, face) in self.faces.iter().enumerate() {
            let id = FaceId(i);
            for start in face.outer.iter().chain(face.inners.iter()) {
                for he in self.face_cycle(*start) {
                    if self.half_edges[he.0].face != id {
                        return Err(OverlayError::InternalInvariant(format!(
                            "component of {id} has a stray incident face at {he}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Iterator over the half-edges of one boundary cycle.
pub struct FaceCycle<'a> {
    dcel: &'a Dcel,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl Iterator for FaceCycle<'_> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        if self.done {
            return None;
        }
        let he = self.current;
        self.current = self.dcel.half_edges[he.0].next;
        if self.current == self.start {
            self.done = true;
        }
        Some(he)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
