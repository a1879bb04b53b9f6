//! Bit-vector indexed (subject, predicate, object) triple store.
//!
//! Two bit-matrices index existence (`predicate -> subjects`,
//! `object -> subjects`); a dense array of per-`(predicate, subject)` object
//! lists carries the actual object values, with the first cell of each list
//! treated as a hot slot so the "subject has exactly one object for this
//! predicate" case — the common one — never walks a list.

mod object_list;

pub use object_list::ObjectList;

use kgc_bitmatrix::{BitMatrix, CancellationToken};
use kgc_ids::{check_capacity, check_in_range, Id, KgError, Sort};
use tracing::debug_span;

/// A (subject, predicate, object) triple of dense ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triple {
    pub subject: Id,
    pub predicate: Id,
    pub object: Id,
}

impl Triple {
    pub fn new(subject: Id, predicate: Id, object: Id) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// The triple store. Allocates two bit-matrices and one dense object-list
/// array at construction; none of them resize during the hot phase.
pub struct TripleStore {
    max_subjects: u32,
    max_predicates: u32,
    max_objects: u32,
    /// Row = predicate, columns = subjects. Bit set iff the subject has at
    /// least one edge labeled that predicate.
    predicate_subject: BitMatrix,
    /// Row = object, columns = subjects. Bit set iff the subject has at
    /// least one edge into that object.
    object_subject: BitMatrix,
    /// Dense `predicate * max_subjects + subject` indexed object lists.
    object_lists: Vec<ObjectList>,
}

impl TripleStore {
    /// Allocates all matrices zeroed. Fails with
    /// [`KgError::AllocationFailed`] on allocator refusal.
    pub fn create(max_subjects: u32, max_predicates: u32, max_objects: u32) -> Result<Self, KgError> {
        let predicate_subject = BitMatrix::try_new(max_predicates as usize, max_subjects as usize)?;
        let object_subject = BitMatrix::try_new(max_objects as usize, max_subjects as usize)?;
        let slot_count = (max_predicates as usize)
            .checked_mul(max_subjects as usize)
            .ok_or_else(|| KgError::AllocationFailed {
                detail: format!(
                    "object list geometry {max_predicates}x{max_subjects} overflows slot count"
                ),
            })?;
        Ok(Self {
            max_subjects,
            max_predicates,
            max_objects,
            predicate_subject,
            object_subject,
            object_lists: vec![ObjectList::new(); slot_count],
        })
    }

    #[inline]
    pub fn max_subjects(&self) -> u32 {
        self.max_subjects
    }

    #[inline]
    pub fn max_predicates(&self) -> u32 {
        self.max_predicates
    }

    #[inline]
    pub fn max_objects(&self) -> u32 {
        self.max_objects
    }

    #[inline]
    fn slot(&self, predicate: Id, subject: Id) -> usize {
        predicate as usize * self.max_subjects as usize + subject as usize
    }

    /// Sets bit `(p, s)` in the predicate-subject matrix, bit `(o, s)` in
    /// the object-subject matrix, and appends `o` to the object list at
    /// `(p, s)` if it is not already present. Idempotent for duplicates.
    pub fn add_triple(&mut self, s: Id, p: Id, o: Id) -> Result<(), KgError> {
        let _span = debug_span!("add_triple", s, p, o).entered();
        check_in_range(Sort::Subject, s, self.max_subjects)?;
        check_in_range(Sort::Predicate, p, self.max_predicates)?;
        check_in_range(Sort::Object, o, self.max_objects)?;

        self.predicate_subject.set(p as usize, s as usize);
        self.object_subject.set(o as usize, s as usize);
        let slot = self.slot(p, s);
        self.object_lists[slot].insert_unique(o);
        Ok(())
    }

    /// The hot path: bounded instruction count, no allocation, never
    /// scales with the number of triples stored.
    #[inline]
    pub fn ask(&self, s: Id, p: Id, o: Id) -> bool {
        if s >= self.max_subjects || p >= self.max_predicates || o >= self.max_objects {
            return false;
        }
        if !self.predicate_subject.test(p as usize, s as usize) {
            return false;
        }
        let list = &self.object_lists[self.slot(p, s)];
        list.contains_hot(o)
    }

    /// The degree of `(s, p)` — how many distinct objects `s` has under
    /// `p`. O(1): the object list already tracks this as a stored count,
    /// it is never derived by walking the list.
    #[inline]
    pub fn degree(&self, s: Id, p: Id) -> u32 {
        if s >= self.max_subjects || p >= self.max_predicates {
            return 0;
        }
        self.object_lists[self.slot(p, s)].len() as u32
    }

    /// Read-only access to the predicate-subject matrix, for the join
    /// kernel and the reasoner's domain/range materialization.
    pub fn predicate_subject_matrix(&self) -> &BitMatrix {
        &self.predicate_subject
    }

    /// Read-only access to the object-subject matrix.
    pub fn object_subject_matrix(&self) -> &BitMatrix {
        &self.object_subject
    }

    /// The object list at `(p, s)`, for the join kernel's `objects_of`.
    pub fn object_list(&self, s: Id, p: Id) -> &ObjectList {
        &self.object_lists[self.slot(p, s)]
    }

    /// Processes 4-wide groups of patterns. Within a group the loads are
    /// data-independent so a vector or superscalar back-end can overlap
    /// them; rare multi-valued misses fall back to a per-pattern list walk
    /// (the 80/20 head-cell optimization documented in the sources must
    /// retain this fallback to preserve ASK-consistency).
    ///
    /// `cancel`, when given, is polled every `poll_granularity` groups
    /// (§5 "checked between `ask_batch` groups"). A cancellation mid-way
    /// returns the results accumulated so far, shorter than `patterns` —
    /// this is query phase, so it never fails, it only stops early.
    pub fn ask_batch(&self, patterns: &[Triple], cancel: Option<&CancellationToken>, poll_granularity: u32) -> Vec<bool> {
        let granularity = poll_granularity.max(1) as usize;
        let mut out = Vec::with_capacity(patterns.len());
        for (group_idx, group) in patterns.chunks(4).enumerate() {
            if group_idx % granularity == 0 && cancel.is_some_and(CancellationToken::is_cancelled) {
                break;
            }
            let mut in_range = [false; 4];
            let mut pred_bit = [false; 4];
            let mut head_match = [false; 4];
            for (i, t) in group.iter().enumerate() {
                in_range[i] =
                    t.subject < self.max_subjects && t.predicate < self.max_predicates && t.object < self.max_objects;
            }
            for (i, t) in group.iter().enumerate() {
                pred_bit[i] = in_range[i] && self.predicate_subject.test(t.predicate as usize, t.subject as usize);
            }
            for (i, t) in group.iter().enumerate() {
                head_match[i] = pred_bit[i]
                    && self.object_lists[self.slot(t.predicate, t.subject)].head() == Some(t.object);
            }
            for (i, t) in group.iter().enumerate() {
                let result = if head_match[i] {
                    true
                } else if pred_bit[i] {
                    self.object_lists[self.slot(t.predicate, t.subject)].contains_hot(t.object)
                } else {
                    false
                };
                out.push(result);
                let _ = i;
            }
        }
        out
    }

    /// Used by the reasoner's domain/range materialization to assert
    /// `rdf:type` facts directly, bypassing the public capacity re-check
    /// (the reasoner has already validated the ids against this store's
    /// declared capacities before calling).
    pub(crate) fn assert_internal(&mut self, s: Id, p: Id, o: Id) {
        self.predicate_subject.set(p as usize, s as usize);
        self.object_subject.set(o as usize, s as usize);
        let slot = self.slot(p, s);
        self.object_lists[slot].insert_unique(o);
    }

    /// Capacity pre-check without mutation, used by callers that want to
    /// validate a batch before committing any of it.
    pub fn check_capacities(&self, max_subjects: u32, max_predicates: u32, max_objects: u32) -> Result<(), KgError> {
        check_capacity(Sort::Subject, max_subjects, self.max_subjects)?;
        check_capacity(Sort::Predicate, max_predicates, self.max_predicates)?;
        check_capacity(Sort::Object, max_objects, self.max_objects)?;
        Ok(())
    }
}

/// Allows the reasoner crate to reach into the store for materialization
/// writes without making `assert_internal` a public API surface.
pub trait StoreInternals {
    fn assert_type_internal(&mut self, s: Id, type_predicate: Id, c: Id);
}

impl StoreInternals for TripleStore {
    fn assert_type_internal(&mut self, s: Id, type_predicate: Id, c: Id) {
        self.assert_internal(s, type_predicate, c);
    }
}
