//! Core capability errors (identifiers, value-model invariants, grid shape).
//!
//! These are bounded and stable: core errors represent domain/refusal states,
//! not library implementation details. Resolution misses and evaluation
//! failures are values in the engine layer, not errors here.

use thiserror::Error;

use crate::error::Scope;

/// Invalid identifier.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("lane id `{raw}` is invalid: {reason}")]
    Lane { raw: String, reason: String },
    #[error("lens id `{raw}` is invalid: {reason}")]
    Lens { raw: String, reason: String },
    #[error("lens instance id `{raw}` is invalid: {reason}")]
    LensInstance { raw: String, reason: String },
    #[error("draft id `{raw}` is invalid: {reason}")]
    Draft { raw: String, reason: String },
    #[error("material id `{raw}` is invalid: {reason}")]
    Material { raw: String, reason: String },
    #[error("clip id `{raw}` is invalid: {reason}")]
    Clip { raw: String, reason: String },
    #[error("cell key `{raw}` is invalid: {reason}")]
    Cell { raw: String, reason: String },
}

/// Value-model invariant violation.
///
/// Raised by the assertion functions at trust boundaries: right after a
/// lens's raw output is normalized, and before a draft is registered into
/// derived state. Inside a guarded normalization step this fails the whole
/// batch for one instance; anywhere else it is a programming error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DraftInvariantError {
    #[error("payload contains a non-finite number")]
    NonFiniteValue,
    #[error("payload must be a list of scalars or nested lists, got {got}")]
    NonListPayload { got: &'static str },
    #[error("missing required identifier `{field}`")]
    MissingIdentifier { field: &'static str },
    #[error("clip timing is invalid: {reason}")]
    InvalidTiming { reason: String },
}

/// Grid shape violation.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum GridError {
    #[error("row {row} is out of range (workspace has {row_count} rows)")]
    RowOutOfRange { row: u32, row_count: u32 },
    #[error("cell {cell} is already occupied")]
    CellOccupied { cell: String },
    #[error("unknown lane `{lane}`")]
    UnknownLane { lane: String },
}

/// Lookup miss against authoritative or derived state.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum LookupError {
    #[error("unknown lens instance `{id}`")]
    LensInstance { id: String },
    #[error("unknown draft `{id}`")]
    Draft { id: String },
    #[error("unknown material `{id}`")]
    Material { id: String },
    #[error("unknown clip `{id}`")]
    Clip { id: String },
    #[error("no lens `{id}` in the registry")]
    Lens { id: String },
    #[error("lens `{id}` is already registered")]
    DuplicateLens { id: String },
}

/// Batching-ceiling configuration violation.
#[derive(Debug, Error, Clone)]
#[error("{field} must be a positive integer")]
pub struct CeilingError {
    pub field: &'static str,
}

/// Canonical error enum for the core capability.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error(transparent)]
    DraftInvariant(#[from] DraftInvariantError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Ceiling(#[from] CeilingError),
}

impl CoreError {
    pub fn scope(&self) -> Scope {
        match self {
            // A draft invariant raised outside a guarded normalization step
            // is a programming error; callers inside the engine catch it
            // per-batch before it ever becomes a CoreError.
            CoreError::DraftInvariant(_) => Scope::Fatal,
            CoreError::InvalidId(_)
            | CoreError::Grid(_)
            | CoreError::Lookup(_)
            | CoreError::Ceiling(_) => Scope::Pass,
        }
    }
}
