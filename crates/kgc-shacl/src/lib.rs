//! A compiled shape validator: SHACL-like node shapes reduced ahead of time
//! to bitmask records so the common case — "does this node satisfy its
//! target class and required properties" — is a handful of word ANDs
//! against mirror matrices the orchestrator keeps in sync with the triple
//! store. Extended constraints (cardinality, datatype, literal-in-set,
//! length/numeric bounds, logical combinators, property paths) live behind
//! a second, opt-in routine so shapes that don't need them never pay for
//! them.

mod shape;
mod validator;

pub use shape::{CardinalityBound, CompiledShape, ConstraintFlags, LogicalCombinators, PropertyPath};
pub use validator::{ExtendedContext, InvalidReason, ShapeValidator, ValidationResult};
