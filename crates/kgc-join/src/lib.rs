//! The join kernel: bit-vector set operations over *result vectors* — bit
//! vectors over subjects with a precomputed cardinality — and the
//! multi-pattern conjunctive ASK that accumulates them into a matching
//! subject set.

use kgc_bitmatrix::BitVector;
use kgc_ids::Id;
use kgc_store::TripleStore;

/// A single conjunct of a conjunctive ASK: "subjects `s` such that
/// `store.ask(s, predicate, object)` holds". The caller supplies the
/// evaluation order (typically least-cardinality first); ordering a
/// conjunct list for cost is a planner's job and out of scope here.
#[derive(Debug, Clone, Copy)]
pub struct SubjectPattern {
    pub predicate: Id,
    pub object: Id,
}

impl SubjectPattern {
    pub fn new(predicate: Id, object: Id) -> Self {
        Self { predicate, object }
    }
}

/// Borrows a [`TripleStore`] to evaluate joins over its matrices without
/// copying them. Result vectors produced here are caller-owned and
/// per-query, per the concurrency model's resource policy.
pub struct JoinKernel<'a> {
    store: &'a TripleStore,
}

impl<'a> JoinKernel<'a> {
    pub fn new(store: &'a TripleStore) -> Self {
        Self { store }
    }

    /// The AND of the predicate row `p` with the object row `o`, word by
    /// word, accumulating popcount.
    pub fn subjects_with(&self, p: Id, o: Id) -> BitVector {
        self.store
            .predicate_subject_matrix()
            .and_row_with(p as usize, self.store.object_subject_matrix(), o as usize)
    }

    /// The object list at `(p, s)` expressed as a bit-vector over objects.
    pub fn objects_of(&self, s: Id, p: Id) -> BitVector {
        let mut v = BitVector::new(self.store.max_objects() as usize);
        for o in self.store.object_list(s, p).iter() {
            v.set(o as usize);
        }
        v
    }

    pub fn intersect(a: &BitVector, b: &BitVector) -> BitVector {
        a.intersect(b)
    }

    pub fn union(a: &BitVector, b: &BitVector) -> BitVector {
        a.union(b)
    }

    pub fn difference(a: &BitVector, b: &BitVector) -> BitVector {
        a.difference(b)
    }

    /// Accumulates an intersecting result vector across `patterns`, with
    /// early termination once cardinality reaches zero. Output subjects are
    /// extracted by iterating set bits (find-lowest-set-bit,
    /// clear-lowest-set-bit).
    pub fn join_conjunctive(&self, patterns: &[SubjectPattern]) -> Vec<Id> {
        let Some((first, rest)) = patterns.split_first() else {
            return Vec::new();
        };
        let mut acc = self.subjects_with(first.predicate, first.object);
        for pat in rest {
            if acc.is_empty() {
                break;
            }
            let next = self.subjects_with(pat.predicate, pat.object);
            acc = acc.intersect(&next);
        }
        acc.iter_set_bits().map(|i| i as Id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_multi_pattern_join() {
        let mut store = TripleStore::create(1000, 300, 300).unwrap();
        const RDF_TYPE: Id = 1;
        const DEPARTMENT: Id = 2;
        const EMPLOYEE: Id = 100;
        for s in 0u32..1000 {
            store.add_triple(s, RDF_TYPE, EMPLOYEE).unwrap();
            store.add_triple(s, DEPARTMENT, 200 + s % 50).unwrap();
        }

        let kernel = JoinKernel::new(&store);
        let mut result = kernel.join_conjunctive(&[
            SubjectPattern::new(RDF_TYPE, EMPLOYEE),
            SubjectPattern::new(DEPARTMENT, 210),
        ]);
        result.sort_unstable();

        let expected: Vec<Id> = (0u32..1000).filter(|s| 200 + s % 50 == 210).collect();
        assert_eq!(result.len(), 20);
        assert_eq!(result, expected);
    }

    #[test]
    fn join_conjunctive_empty_patterns_is_empty() {
        let store = TripleStore::create(10, 2, 10).unwrap();
        let kernel = JoinKernel::new(&store);
        assert!(kernel.join_conjunctive(&[]).is_empty());
    }

    #[test]
    fn join_conjunctive_early_terminates_on_empty_intersection() {
        let mut store = TripleStore::create(10, 2, 10).unwrap();
        store.add_triple(0, 0, 0).unwrap();
        store.add_triple(1, 1, 1).unwrap();
        let kernel = JoinKernel::new(&store);
        let result = kernel.join_conjunctive(&[SubjectPattern::new(0, 0), SubjectPattern::new(1, 1)]);
        assert!(result.is_empty());
    }

    #[test]
    fn objects_of_reflects_object_list() {
        let mut store = TripleStore::create(10, 2, 50).unwrap();
        store.add_triple(1, 0, 5).unwrap();
        store.add_triple(1, 0, 7).unwrap();
        let kernel = JoinKernel::new(&store);
        let v = kernel.objects_of(1, 0);
        assert!(v.test(5));
        assert!(v.test(7));
        assert!(!v.test(6));
        assert_eq!(v.popcount(), 2);
    }

    #[test]
    fn set_op_laws() {
        let mut store = TripleStore::create(64, 4, 64).unwrap();
        for s in [1u32, 2, 3, 70 % 64] {
            store.add_triple(s, 0, 0).unwrap();
        }
        for s in [2u32, 3, 4] {
            store.add_triple(s, 1, 0).unwrap();
        }
        let kernel = JoinKernel::new(&store);
        let a = kernel.subjects_with(0, 0);
        let b = kernel.subjects_with(1, 0);

        let ab = JoinKernel::intersect(&a, &b);
        let ba = JoinKernel::intersect(&b, &a);
        assert_eq!(ab.iter_set_bits().collect::<Vec<_>>(), ba.iter_set_bits().collect::<Vec<_>>());

        let diff_aa = JoinKernel::difference(&a, &a);
        assert_eq!(diff_aa.popcount(), 0);

        let lhs = JoinKernel::union(&a, &JoinKernel::difference(&b, &a));
        let rhs = JoinKernel::union(&a, &b);
        assert_eq!(lhs.iter_set_bits().collect::<Vec<_>>(), rhs.iter_set_bits().collect::<Vec<_>>());
    }

    // Property 4: intersect/union commute, difference(a,a) is empty,
    // union(a, difference(b,a)) == union(a,b).
    proptest::proptest! {
        #[test]
        fn set_op_laws_hold_for_arbitrary_subject_sets(
            a_bits in proptest::collection::vec(0u32..64, 0..20),
            b_bits in proptest::collection::vec(0u32..64, 0..20),
        ) {
            let mut store = TripleStore::create(64, 2, 8).unwrap();
            for &s in &a_bits {
                store.add_triple(s, 0, 0).unwrap();
            }
            for &s in &b_bits {
                store.add_triple(s, 1, 0).unwrap();
            }
            let kernel = JoinKernel::new(&store);
            let a = kernel.subjects_with(0, 0);
            let b = kernel.subjects_with(1, 0);

            let ab = JoinKernel::intersect(&a, &b).iter_set_bits().collect::<Vec<_>>();
            let ba = JoinKernel::intersect(&b, &a).iter_set_bits().collect::<Vec<_>>();
            proptest::prop_assert_eq!(&ab, &ba);

            let uab = JoinKernel::union(&a, &b).iter_set_bits().collect::<Vec<_>>();
            let uba = JoinKernel::union(&b, &a).iter_set_bits().collect::<Vec<_>>();
            proptest::prop_assert_eq!(uab, uba);

            proptest::prop_assert_eq!(JoinKernel::difference(&a, &a).popcount(), 0);

            let lhs = JoinKernel::union(&a, &JoinKernel::difference(&b, &a)).iter_set_bits().collect::<Vec<_>>();
            let rhs = JoinKernel::union(&a, &b).iter_set_bits().collect::<Vec<_>>();
            proptest::prop_assert_eq!(lhs, rhs);
        }
    }
}
