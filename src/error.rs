use thiserror::Error;

/// Failure modes of the overlay pipeline.
///
/// Segment intersection and point-in-ring location are total functions on
/// valid inputs and never fail; only the overlay itself surfaces these.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The caller supplied a polygon that violates the simple-ring or
    /// hole-nesting preconditions, or a segment with coincident endpoints.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The inputs place intersection points too close to existing geometry
    /// to be resolved in double precision without snap rounding (which this
    /// crate does not perform). Callers can retry after preprocessing.
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// A DCEL pointer law or a face-reassignment precondition failed.
    /// Indicates a bug rather than bad input; never recovered.
    #[error("internal invariant broken: {0}")]
    InternalInvariant(String),
}
