use crate::Sort;
use thiserror::Error;

/// The shared error taxonomy for every engine in the workspace.
///
/// The hot ASK, validate, and subsumption paths never return this type —
/// they are total functions of in-range inputs to a boolean, per spec.
/// `KgError` only surfaces from mutation-phase operations (`add_triple`,
/// axiom adders, `materialize`, shape registration) and from construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KgError {
    /// A mutation would push a matrix dimension past its declared capacity.
    #[error("{sort} capacity exceeded: requested {requested}, capacity {capacity}")]
    CapacityExceeded {
        sort: Sort,
        requested: u32,
        capacity: u32,
    },

    /// An id argument exceeds its sort's declared capacity.
    #[error("{sort} id {id} out of range for capacity {capacity}")]
    OutOfRange { sort: Sort, id: u32, capacity: u32 },

    /// A query was issued before materialization when the answer would be
    /// wrong, or a mutation was issued on an engine frozen into query phase.
    #[error("phase violation in {engine}: {detail}")]
    PhaseViolation {
        engine: &'static str,
        detail: String,
    },

    /// Validation was attempted against an empty shape slot.
    #[error("unknown shape slot {shape_id}")]
    UnknownShape { shape_id: u32 },

    /// The allocator refused a request during `create` or `materialize`.
    #[error("allocation failed: {detail}")]
    AllocationFailed { detail: String },

    /// `EngineConfig` could not be read or parsed. Distinct from
    /// `PhaseViolation`: this is a construction-time input error, not a
    /// runtime phase-discipline breach.
    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },
}
