//! Planar overlay of two polygons on a doubly connected edge list.
//!
//! Given two simple polygons, [`overlay`] computes the planar subdivision
//! induced by both boundaries, with every face labelled by which input
//! interiors cover it. The set-theoretic operations — intersection, union,
//! difference, symmetric difference — are then face selections by label
//! mask ([`LabelledSubdivision::select`]).
//!
//! The pipeline: each input becomes a DCEL whose half-edges carry the
//! input's interior flag, each DCEL is re-nodded against the other
//! boundary (edges split at every crossing, located through an R-tree),
//! the two edge sets are merged with coincident pairs deduplicated, edges
//! are re-sorted radially around every shared vertex, and the face list is
//! rebuilt from the resulting boundary cycles.
//!
//! The supporting pieces are exposed on their own: the robust
//! [`orientation`] predicate, closed-form [segment
//! intersection](Segment::intersect), and ray-cast [point-in-ring
//! location](point_in_ring).
//!
//! All computation is sequential and stays in the X/Y plane on exact
//! IEEE-754 doubles; there is no snap rounding. Inputs must be valid
//! simple polygons with finite coordinates, holes inside the exterior and
//! pairwise disjoint.

pub mod dcel;
pub mod error;
pub mod overlay;
pub mod predicates;
mod renode;
pub mod ring;
pub mod seg;

pub use dcel::{Dcel, EdgeLabels, Face, FaceId, HalfEdge, HalfEdgeId, Input, Vertex, VertexId};
pub use error::OverlayError;
pub use overlay::{overlay, FaceView, LabelledSubdivision, OverlayOp};
pub use predicates::{on_segment, orientation, signed_horizontal_distance, xy_less, Orientation};
pub use ring::{point_in_ring, RingLocation};
pub use seg::{SegIntersection, Segment};
