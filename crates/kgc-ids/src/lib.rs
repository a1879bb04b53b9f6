//! Dense integer identifiers and the shared error taxonomy for the kgc
//! knowledge-graph kernel.
//!
//! Every engine in the workspace (store, reasoner, shape validator,
//! compliance certifier, orchestrator) consumes and produces [`Id`] values
//! exclusively. IDs are dense from zero within each [`Sort`]; the maximum ID
//! per sort is fixed at engine construction, which in turn fixes every
//! bit-matrix row width the workspace allocates.

mod error;
mod sort;

pub use error::KgError;
pub use sort::Sort;

/// A dense, zero-based identifier. [`ABSENT`] is reserved as a sentinel for
/// "no such id" and is never a valid in-range identifier.
pub type Id = u32;

/// Sentinel value denoting "absent". All-ones, so it can never collide with
/// a dense in-range id for any capacity below `u32::MAX`.
pub const ABSENT: Id = u32::MAX;

/// Checks `id` against a declared capacity for `sort`, returning
/// [`KgError::OutOfRange`] if `id >= capacity`.
#[inline]
pub fn check_in_range(sort: Sort, id: Id, capacity: u32) -> Result<(), KgError> {
    if id >= capacity {
        Err(KgError::OutOfRange {
            sort,
            id,
            capacity,
        })
    } else {
        Ok(())
    }
}

/// Checks that growing a sort to `requested` would not exceed `capacity`.
#[inline]
pub fn check_capacity(sort: Sort, requested: u32, capacity: u32) -> Result<(), KgError> {
    if requested > capacity {
        Err(KgError::CapacityExceeded {
            sort,
            requested,
            capacity,
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_never_in_range() {
        assert!(check_in_range(Sort::Subject, ABSENT, 1_000_000).is_err());
    }

    #[test]
    fn in_range_passes() {
        assert!(check_in_range(Sort::Subject, 41, 100).is_ok());
        assert!(check_in_range(Sort::Subject, 99, 100).is_ok());
    }

    #[test]
    fn out_of_range_fails_at_boundary() {
        assert!(check_in_range(Sort::Subject, 100, 100).is_err());
    }

    #[test]
    fn capacity_exceeded_at_boundary() {
        assert!(check_capacity(Sort::Class, 101, 100).is_err());
        assert!(check_capacity(Sort::Class, 100, 100).is_ok());
    }
}
