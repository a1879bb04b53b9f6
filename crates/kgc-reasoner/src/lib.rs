//! Precomputed transitive closures of subclass/subproperty graphs as
//! bit-matrices, giving O(1) subsumption queries. Separate from the triple
//! store (so the store stays cache-thin) but references it for
//! materialized inferences.

mod axiom;

pub use axiom::Axiom;

use kgc_bitmatrix::{BitVector, CancellationToken};
use kgc_ids::{check_in_range, Id, KgError, Sort};
use kgc_store::{StoreInternals, TripleStore};
use kgc_bitmatrix::BitMatrix;
use tracing::debug_span;

/// Subclass, subproperty, equivalent-class, disjoint-with axioms and the
/// derived closures, plus the property-characteristic vectors
/// (transitive, symmetric, functional, inverse-functional, reflexive).
pub struct Reasoner {
    max_classes: u32,
    max_properties: u32,
    rdf_type_predicate: Id,
    /// Row `c` is the ancestor set of `c`: bit `k` set iff `c ⊑ k`.
    subclass: BitMatrix,
    /// Same shape and semantics for properties.
    subproperty: BitMatrix,
    transitive: BitVector,
    symmetric: BitVector,
    functional: BitVector,
    inverse_functional: BitVector,
    reflexive: BitVector,
    disjoint_pairs: Vec<(Id, Id)>,
    axiom_log: Vec<Axiom>,
    materialized: bool,
}

impl Reasoner {
    /// Allocates the closure matrices and property vectors, setting the
    /// subclass/subproperty diagonals (reflexivity holds from construction,
    /// independent of `materialize`).
    pub fn create(max_classes: u32, max_properties: u32, rdf_type_predicate: Id) -> Result<Self, KgError> {
        let mut subclass = BitMatrix::try_new(max_classes as usize, max_classes as usize)?;
        let mut subproperty = BitMatrix::try_new(max_properties as usize, max_properties as usize)?;
        for c in 0..max_classes as usize {
            subclass.set(c, c);
        }
        for p in 0..max_properties as usize {
            subproperty.set(p, p);
        }
        Ok(Self {
            max_classes,
            max_properties,
            rdf_type_predicate,
            subclass,
            subproperty,
            transitive: BitVector::new(max_properties as usize),
            symmetric: BitVector::new(max_properties as usize),
            functional: BitVector::new(max_properties as usize),
            inverse_functional: BitVector::new(max_properties as usize),
            reflexive: BitVector::new(max_properties as usize),
            disjoint_pairs: Vec::new(),
            axiom_log: Vec::new(),
            materialized: false,
        })
    }

    #[inline]
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    /// Axioms recorded so far, for introspection and replay in tests.
    pub fn axiom_log(&self) -> &[Axiom] {
        &self.axiom_log
    }

    /// Marks any prior `materialize()` stale. Called by every axiom adder
    /// (§4.2) and, via the orchestrator, by `add_triple` — re-entering the
    /// mutation phase after materialization invalidates it (spec.md §4.2's
    /// state machine; property 10's "documented re-materialize-required
    /// signal" is exactly this flag).
    pub fn invalidate(&mut self) {
        self.materialized = false;
    }

    pub fn add_subclass(&mut self, sub: Id, sup: Id) -> Result<(), KgError> {
        let _span = debug_span!("add_subclass", sub, sup).entered();
        check_in_range(Sort::Class, sub, self.max_classes)?;
        check_in_range(Sort::Class, sup, self.max_classes)?;
        self.subclass.set(sub as usize, sup as usize);
        self.axiom_log.push(Axiom::SubClass { sub, sup });
        self.invalidate();
        Ok(())
    }

    /// Equivalence is implemented as bidirectional subclass addition before
    /// closure, not as a separate pass — a cycle's nodes end up with
    /// identical ancestor rows once the Warshall pass runs.
    pub fn add_equivalent_class(&mut self, a: Id, b: Id) -> Result<(), KgError> {
        let _span = debug_span!("add_equivalent_class", a, b).entered();
        check_in_range(Sort::Class, a, self.max_classes)?;
        check_in_range(Sort::Class, b, self.max_classes)?;
        self.subclass.set(a as usize, b as usize);
        self.subclass.set(b as usize, a as usize);
        self.axiom_log.push(Axiom::EquivalentClass { a, b });
        self.invalidate();
        Ok(())
    }

    pub fn add_disjoint(&mut self, a: Id, b: Id) -> Result<(), KgError> {
        let _span = debug_span!("add_disjoint", a, b).entered();
        check_in_range(Sort::Class, a, self.max_classes)?;
        check_in_range(Sort::Class, b, self.max_classes)?;
        self.disjoint_pairs.push((a, b));
        self.axiom_log.push(Axiom::Disjoint { a, b });
        Ok(())
    }

    pub fn add_subproperty(&mut self, sub: Id, sup: Id) -> Result<(), KgError> {
        let _span = debug_span!("add_subproperty", sub, sup).entered();
        check_in_range(Sort::Property, sub, self.max_properties)?;
        check_in_range(Sort::Property, sup, self.max_properties)?;
        self.subproperty.set(sub as usize, sup as usize);
        self.axiom_log.push(Axiom::SubProperty { sub, sup });
        self.invalidate();
        Ok(())
    }

    pub fn add_domain(&mut self, property: Id, class: Id) -> Result<(), KgError> {
        let _span = debug_span!("add_domain", property, class).entered();
        check_in_range(Sort::Property, property, self.max_properties)?;
        check_in_range(Sort::Class, class, self.max_classes)?;
        self.axiom_log.push(Axiom::Domain { property, class });
        self.invalidate();
        Ok(())
    }

    pub fn add_range(&mut self, property: Id, class: Id) -> Result<(), KgError> {
        let _span = debug_span!("add_range", property, class).entered();
        check_in_range(Sort::Property, property, self.max_properties)?;
        check_in_range(Sort::Class, class, self.max_classes)?;
        self.axiom_log.push(Axiom::Range { property, class });
        self.invalidate();
        Ok(())
    }

    pub fn set_transitive(&mut self, property: Id) -> Result<(), KgError> {
        let _span = debug_span!("set_transitive", property).entered();
        check_in_range(Sort::Property, property, self.max_properties)?;
        self.transitive.set(property as usize);
        self.axiom_log.push(Axiom::Transitive { property });
        Ok(())
    }

    pub fn set_symmetric(&mut self, property: Id) -> Result<(), KgError> {
        let _span = debug_span!("set_symmetric", property).entered();
        check_in_range(Sort::Property, property, self.max_properties)?;
        self.symmetric.set(property as usize);
        self.axiom_log.push(Axiom::Symmetric { property });
        Ok(())
    }

    pub fn set_functional(&mut self, property: Id) -> Result<(), KgError> {
        let _span = debug_span!("set_functional", property).entered();
        check_in_range(Sort::Property, property, self.max_properties)?;
        self.functional.set(property as usize);
        self.axiom_log.push(Axiom::Functional { property });
        Ok(())
    }

    pub fn set_inverse_functional(&mut self, property: Id) -> Result<(), KgError> {
        let _span = debug_span!("set_inverse_functional", property).entered();
        check_in_range(Sort::Property, property, self.max_properties)?;
        self.inverse_functional.set(property as usize);
        self.axiom_log.push(Axiom::InverseFunctional { property });
        Ok(())
    }

    pub fn set_reflexive(&mut self, property: Id) -> Result<(), KgError> {
        let _span = debug_span!("set_reflexive", property).entered();
        check_in_range(Sort::Property, property, self.max_properties)?;
        self.reflexive.set(property as usize);
        self.axiom_log.push(Axiom::Reflexive { property });
        Ok(())
    }

    pub fn is_transitive(&self, property: Id) -> bool {
        (property as usize) < self.max_properties as usize && self.transitive.test(property as usize)
    }

    pub fn is_symmetric(&self, property: Id) -> bool {
        (property as usize) < self.max_properties as usize && self.symmetric.test(property as usize)
    }

    pub fn is_functional(&self, property: Id) -> bool {
        (property as usize) < self.max_properties as usize && self.functional.test(property as usize)
    }

    pub fn is_inverse_functional(&self, property: Id) -> bool {
        (property as usize) < self.max_properties as usize && self.inverse_functional.test(property as usize)
    }

    /// Closes the subclass and subproperty matrices under transitivity via
    /// bit-parallel Warshall, then walks the axiom log to inject
    /// domain/range inferences into `store`.
    ///
    /// `cancel`, when given, is polled every `poll_granularity` Warshall
    /// pivots (§5 "checked between Warshall pivots"). A cancellation mid-way
    /// leaves `materialized` false and the closure matrices partially
    /// widened — safe because closure bits are only ever OR'd in, never
    /// cleared, so a partial pass is a subset of the true closure, not a
    /// corrupt one; a subsequent `materialize` call resumes the same
    /// monotonic widening rather than needing a rollback.
    ///
    /// All-or-nothing otherwise: this method performs no partial mutation
    /// visible to callers on failure — in this implementation closure and
    /// injection cannot fail once construction has succeeded, so the only
    /// non-cancellation failure mode is conceptual (reserved for an
    /// allocator that refuses to grow scratch state in a future
    /// implementation).
    pub fn materialize(
        &mut self,
        store: &mut TripleStore,
        cancel: Option<&CancellationToken>,
        poll_granularity: u32,
    ) -> Result<(), KgError> {
        let _span = debug_span!("materialize", max_classes = self.max_classes, max_properties = self.max_properties).entered();
        let granularity = poll_granularity.max(1);

        if !warshall_close(&mut self.subclass, self.max_classes as usize, cancel, granularity) {
            return Ok(());
        }
        if !warshall_close(&mut self.subproperty, self.max_properties as usize, cancel, granularity) {
            return Ok(());
        }
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Ok(());
        }

        for axiom in self.axiom_log.clone() {
            match axiom {
                Axiom::Domain { property, class } => {
                    let subjects: Vec<Id> = store
                        .predicate_subject_matrix()
                        .iter_set_bits(property as usize)
                        .map(|s| s as Id)
                        .collect();
                    for s in subjects {
                        store.assert_type_internal(s, self.rdf_type_predicate, class);
                    }
                }
                Axiom::Range { property, class } => {
                    let subjects: Vec<Id> = store
                        .predicate_subject_matrix()
                        .iter_set_bits(property as usize)
                        .map(|s| s as Id)
                        .collect();
                    for s in subjects {
                        let objects: Vec<Id> = store.object_list(s, property).iter().collect();
                        for o in objects {
                            store.assert_type_internal(o, self.rdf_type_predicate, class);
                        }
                    }
                }
                _ => {}
            }
        }

        self.materialized = true;
        Ok(())
    }

    /// Test bit `(a, b)` in the subclass matrix: fixed instruction count,
    /// one row load, one bit shift, one AND, one compare.
    #[inline]
    pub fn is_subclass_of(&self, a: Id, b: Id) -> bool {
        if a >= self.max_classes || b >= self.max_classes {
            return false;
        }
        self.subclass.test(a as usize, b as usize)
    }

    #[inline]
    pub fn is_subproperty_of(&self, a: Id, b: Id) -> bool {
        if a >= self.max_properties || b >= self.max_properties {
            return false;
        }
        self.subproperty.test(a as usize, b as usize)
    }

    /// The first disjoint-class pair violated by `s`'s asserted types, if
    /// any. Read-only and advisory: the core never refuses an `add_triple`
    /// that creates an inconsistency, since insertion is monotonic.
    pub fn check_disjoint_violation(&self, store: &TripleStore, s: Id) -> Option<(Id, Id)> {
        let types: Vec<Id> = store.object_list(s, self.rdf_type_predicate).iter().collect();
        for &(a, b) in &self.disjoint_pairs {
            let has_a = types.iter().any(|&t| self.is_subclass_of(t, a));
            let has_b = types.iter().any(|&t| self.is_subclass_of(t, b));
            if has_a && has_b {
                return Some((a, b));
            }
        }
        None
    }

    /// Tries `store.ask(s, p, o)` first; if false and `p` is `rdf:type`,
    /// checks whether any asserted type of `s` subsumes `o`; else walks
    /// subproperties of `p`; else, if `p` is transitive, returns `false` —
    /// single-hop transitive closure beyond subproperty/subclass is not
    /// materialized in this core, an acknowledged open point.
    pub fn ask_with_reasoning(&self, store: &TripleStore, s: Id, p: Id, o: Id) -> bool {
        if store.ask(s, p, o) {
            return true;
        }
        if p == self.rdf_type_predicate {
            return store
                .object_list(s, self.rdf_type_predicate)
                .iter()
                .any(|t| self.is_subclass_of(t, o));
        }
        if p < self.max_properties {
            for q in 0..self.max_properties {
                if q != p && self.is_subproperty_of(q, p) && store.ask(s, q, o) {
                    return true;
                }
            }
        }
        false
    }
}

/// Bit-parallel Warshall closure: for each pivot `k`, for each row `i`, if
/// bit `(i, k)` is set, OR row `k` into row `i`. Each inner step is a
/// word-parallel OR of one stride; the cost is cubic in `n` only in the
/// abstract sense of the outer loop nest.
///
/// Polls `cancel` every `poll_granularity` pivots. Returns `false` if
/// cancelled before the pass finished (the matrix is left partially
/// widened, never over-widened), `true` on completion.
fn warshall_close(matrix: &mut BitMatrix, n: usize, cancel: Option<&CancellationToken>, poll_granularity: u32) -> bool {
    for k in 0..n {
        if k % poll_granularity as usize == 0 && cancel.is_some_and(CancellationToken::is_cancelled) {
            return false;
        }
        for i in 0..n {
            if matrix.test(i, k) {
                matrix.or_row_into(i, k);
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const RDF_TYPE: Id = 0;

    #[test]
    fn s2_reasoning() {
        let mut store = TripleStore::create(100, 2, 150).unwrap();
        let mut reasoner = Reasoner::create(150, 2, RDF_TYPE).unwrap();

        const EMPLOYEE: Id = 100;
        const MANAGER: Id = 101;
        reasoner.add_subclass(MANAGER, EMPLOYEE).unwrap();

        store.add_triple(7, RDF_TYPE, MANAGER).unwrap();
        reasoner.materialize(&mut store, None, 1).unwrap();

        assert!(reasoner.ask_with_reasoning(&store, 7, RDF_TYPE, EMPLOYEE));
        assert!(!store.ask(7, RDF_TYPE, EMPLOYEE));
        assert!(reasoner.is_subclass_of(MANAGER, EMPLOYEE));
        assert!(!reasoner.is_subclass_of(EMPLOYEE, MANAGER));
        assert!(reasoner.is_subclass_of(MANAGER, MANAGER));
    }

    #[test]
    fn reasoning_aware_ask_superset_of_ask() {
        let mut store = TripleStore::create(10, 2, 10).unwrap();
        let mut reasoner = Reasoner::create(10, 2, RDF_TYPE).unwrap();
        store.add_triple(1, RDF_TYPE, 5).unwrap();
        reasoner.materialize(&mut store, None, 1).unwrap();
        assert!(reasoner.ask_with_reasoning(&store, 1, RDF_TYPE, 5));
    }

    #[test]
    fn cyclic_equivalence_collapses_rows() {
        let mut store = TripleStore::create(4, 2, 10).unwrap();
        let mut reasoner = Reasoner::create(10, 2, RDF_TYPE).unwrap();
        reasoner.add_equivalent_class(1, 2).unwrap();
        reasoner.add_subclass(2, 3).unwrap();
        reasoner.materialize(&mut store, None, 1).unwrap();
        assert!(reasoner.is_subclass_of(1, 2));
        assert!(reasoner.is_subclass_of(2, 1));
        assert!(reasoner.is_subclass_of(1, 3));
        assert!(reasoner.is_subclass_of(2, 3));
    }

    #[test]
    fn domain_range_materialize_into_store() {
        let mut store = TripleStore::create(10, 3, 10).unwrap();
        let mut reasoner = Reasoner::create(10, 3, RDF_TYPE).unwrap();
        const WORKS_AT: Id = 1;
        const PERSON: Id = 4;
        const COMPANY: Id = 5;
        reasoner.add_domain(WORKS_AT, PERSON).unwrap();
        reasoner.add_range(WORKS_AT, COMPANY).unwrap();
        store.add_triple(2, WORKS_AT, 3).unwrap();
        reasoner.materialize(&mut store, None, 1).unwrap();
        assert!(store.ask(2, RDF_TYPE, PERSON));
        assert!(store.ask(3, RDF_TYPE, COMPANY));
    }

    #[test]
    fn disjoint_violation_detected() {
        let mut store = TripleStore::create(10, 2, 10).unwrap();
        let mut reasoner = Reasoner::create(10, 2, RDF_TYPE).unwrap();
        reasoner.add_disjoint(5, 6).unwrap();
        store.add_triple(1, RDF_TYPE, 5).unwrap();
        store.add_triple(1, RDF_TYPE, 6).unwrap();
        reasoner.materialize(&mut store, None, 1).unwrap();
        assert_eq!(reasoner.check_disjoint_violation(&store, 1), Some((5, 6)));
        assert_eq!(reasoner.check_disjoint_violation(&store, 2), None);
    }

    /// Property 10: a mutation issued after `materialize()` invalidates it
    /// until the next `materialize()` — the documented re-materialize
    /// signal, not a hard refusal.
    #[test]
    fn axiom_added_after_materialize_invalidates_it() {
        let mut store = TripleStore::create(10, 2, 10).unwrap();
        let mut reasoner = Reasoner::create(10, 2, RDF_TYPE).unwrap();
        reasoner.materialize(&mut store, None, 1).unwrap();
        assert!(reasoner.is_materialized());

        reasoner.add_subclass(1, 2).unwrap();
        assert!(!reasoner.is_materialized());

        reasoner.materialize(&mut store, None, 1).unwrap();
        assert!(reasoner.is_materialized());
        assert!(reasoner.is_subclass_of(1, 2));
    }

    #[test]
    fn cancelled_materialize_leaves_it_unmaterialized_but_not_corrupt() {
        let mut store = TripleStore::create(4, 1, 10).unwrap();
        let mut reasoner = Reasoner::create(20, 1, RDF_TYPE).unwrap();
        for c in 0..19u32 {
            reasoner.add_subclass(c, c + 1).unwrap();
        }
        let token = CancellationToken::new();
        token.cancel();
        reasoner.materialize(&mut store, Some(&token), 1).unwrap();
        assert!(!reasoner.is_materialized());

        // Direct edges still hold even though the transitive pass aborted.
        assert!(reasoner.is_subclass_of(0, 1));
        assert!(reasoner.is_subclass_of(5, 5));
    }

    proptest::proptest! {
        #[test]
        fn subclass_closure_matches_reachability(
            edges in proptest::collection::vec((0u32..15, 0u32..15), 0..40)
        ) {
            let mut store = TripleStore::create(1, 1, 1).unwrap();
            let mut reasoner = Reasoner::create(15, 1, 0).unwrap();
            for &(sub, sup) in &edges {
                reasoner.add_subclass(sub, sup).unwrap();
            }
            reasoner.materialize(&mut store, None, 1).unwrap();

            // BFS reachability over the asserted edges, as an oracle.
            let mut adj = std::collections::HashMap::<u32, Vec<u32>>::new();
            for &(sub, sup) in &edges {
                adj.entry(sub).or_default().push(sup);
            }
            for x in 0u32..15 {
                for y in 0u32..15 {
                    let mut reachable = x == y;
                    if !reachable {
                        let mut stack = vec![x];
                        let mut seen = std::collections::HashSet::new();
                        while let Some(n) = stack.pop() {
                            if n == y {
                                reachable = true;
                                break;
                            }
                            if !seen.insert(n) {
                                continue;
                            }
                            if let Some(next) = adj.get(&n) {
                                stack.extend(next.iter().copied());
                            }
                        }
                    }
                    proptest::prop_assert_eq!(reasoner.is_subclass_of(x, y), reachable);
                }
            }
        }

        // Property 6: ask(q) == true implies ask_with_reasoning(q) == true.
        #[test]
        fn reasoning_aware_ask_is_superset_of_ask(
            triples in proptest::collection::vec((0u32..20, 0u32..20), 0..60)
        ) {
            let mut store = TripleStore::create(20, 1, 20).unwrap();
            let mut reasoner = Reasoner::create(20, 1, RDF_TYPE).unwrap();
            for &(s, o) in &triples {
                store.add_triple(s, RDF_TYPE, o).unwrap();
            }
            reasoner.materialize(&mut store, None, 1).unwrap();
            for s in 0u32..20 {
                for o in 0u32..20 {
                    if store.ask(s, RDF_TYPE, o) {
                        proptest::prop_assert!(reasoner.ask_with_reasoning(&store, s, RDF_TYPE, o));
                    }
                }
            }
        }
    }
}
