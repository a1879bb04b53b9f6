//! The façade: owns the triple store, reasoner, and shape validator, keeps
//! the validator's node-class / node-property mirrors in sync with store
//! writes, and exposes one query surface spanning all three engines plus
//! the join kernel's set operations.

pub mod config;
mod interner;

pub use config::EngineConfig;
pub use interner::{DenseInterner, StringInterner};

use kgc_bitmatrix::{BitVector, CancellationToken};
use kgc_ids::{Id, KgError};
use kgc_join::JoinKernel;
use kgc_reasoner::Reasoner;
use kgc_shacl::{CompiledShape, ExtendedContext, ShapeValidator, ValidationResult};
use kgc_store::{Triple, TripleStore};
use tracing::debug_span;

pub struct Orchestrator {
    store: TripleStore,
    reasoner: Reasoner,
    validator: ShapeValidator,
    interner: Box<dyn StringInterner + Send + Sync>,
    rdf_type_predicate: Id,
    cancellation_poll_granularity: u32,
}

impl Orchestrator {
    pub fn create(cfg: &EngineConfig) -> Result<Self, KgError> {
        Self::create_with_interner(cfg, Box::new(DenseInterner::new()))
    }

    pub fn create_with_interner(
        cfg: &EngineConfig,
        interner: Box<dyn StringInterner + Send + Sync>,
    ) -> Result<Self, KgError> {
        let store = TripleStore::create(cfg.max_subjects, cfg.max_predicates, cfg.max_objects)?;
        let reasoner = Reasoner::create(cfg.max_classes, cfg.max_properties, cfg.rdf_type_predicate)?;
        let validator = ShapeValidator::create(
            cfg.max_subjects,
            cfg.max_classes,
            cfg.max_properties,
            cfg.max_datatypes,
            cfg.max_shapes,
        )?;
        Ok(Self {
            store,
            reasoner,
            validator,
            interner,
            rdf_type_predicate: cfg.rdf_type_predicate,
            cancellation_poll_granularity: cfg.cancellation_poll_granularity,
        })
    }

    /// Consults the compliance certifier (§4.5) before constructing any
    /// engine. Missing the configured target tier is logged, not fatal —
    /// §4.5 names the certifier as advisory pre-flight, not a hard gate.
    pub fn from_config(cfg: &EngineConfig) -> Result<Self, KgError> {
        let _span = debug_span!("orchestrator_from_config").entered();
        let schema = cfg.declared_schema(true);
        let cert = kgc_compliance::certify("orchestrator", &schema);
        if !Self::meets_target(&cert.tier, cfg.target_tier) {
            tracing::warn!(
                certified_tier = ?cert.tier,
                target_tier = ?cfg.target_tier,
                total_kib = cert.breakdown.total_kib(),
                "declared schema misses its configured target tier"
            );
        }
        Self::create(cfg)
    }

    fn meets_target(certified: &kgc_compliance::Tier, target: config::TargetTier) -> bool {
        use config::TargetTier;
        use kgc_compliance::Tier;
        match target {
            TargetTier::Any => !matches!(certified, Tier::NonCompliant),
            TargetTier::L1 => matches!(certified, Tier::L1),
            TargetTier::L2 => matches!(certified, Tier::L1 | Tier::L2),
            TargetTier::L3 => matches!(certified, Tier::L1 | Tier::L2 | Tier::L3),
        }
    }

    // -- mutation phase -----------------------------------------------

    /// Adds `(s, p, o)` to the store, mirrors property-existence into the
    /// validator's node-property matrix, and — when `p` is the configured
    /// `rdf:type` predicate — mirrors the asserted type into the
    /// validator's node-class matrix too. Re-entering the mutation phase
    /// this way invalidates any prior `materialize()` (spec.md §4.2's state
    /// machine): a new triple can change what domain/range/disjoint
    /// inferences should hold, so the reasoner's closure is stale until the
    /// next `materialize()`.
    pub fn add_triple(&mut self, s: Id, p: Id, o: Id) -> Result<(), KgError> {
        let _span = debug_span!("orchestrator_add_triple", s, p, o).entered();
        self.store.add_triple(s, p, o)?;
        self.validator.set_property(s, p)?;
        if p == self.rdf_type_predicate {
            self.validator.set_class(s, o)?;
        }
        self.reasoner.invalidate();
        Ok(())
    }

    pub fn add_subclass(&mut self, sub: Id, sup: Id) -> Result<(), KgError> {
        self.reasoner.add_subclass(sub, sup)
    }

    pub fn add_equivalent_class(&mut self, a: Id, b: Id) -> Result<(), KgError> {
        self.reasoner.add_equivalent_class(a, b)
    }

    pub fn add_disjoint(&mut self, a: Id, b: Id) -> Result<(), KgError> {
        self.reasoner.add_disjoint(a, b)
    }

    pub fn add_subproperty(&mut self, sub: Id, sup: Id) -> Result<(), KgError> {
        self.reasoner.add_subproperty(sub, sup)
    }

    pub fn add_domain(&mut self, property: Id, class: Id) -> Result<(), KgError> {
        self.reasoner.add_domain(property, class)
    }

    pub fn add_range(&mut self, property: Id, class: Id) -> Result<(), KgError> {
        self.reasoner.add_range(property, class)
    }

    pub fn register_shape(&mut self, shape_id: Id, shape: CompiledShape) -> Result<(), KgError> {
        self.validator.register_shape(shape_id, shape)
    }

    pub fn materialize(&mut self, cancel: Option<&CancellationToken>) -> Result<(), KgError> {
        self.reasoner.materialize(&mut self.store, cancel, self.cancellation_poll_granularity)
    }

    pub fn intern(&mut self, s: &str) -> u32 {
        self.interner.intern(s)
    }

    // -- query phase ----------------------------------------------------

    pub fn ask(&self, s: Id, p: Id, o: Id) -> bool {
        self.store.ask(s, p, o)
    }

    pub fn ask_batch(&self, patterns: &[Triple], cancel: Option<&CancellationToken>) -> Vec<bool> {
        self.store.ask_batch(patterns, cancel, self.cancellation_poll_granularity)
    }

    pub fn ask_with_reasoning(&self, s: Id, p: Id, o: Id) -> bool {
        self.reasoner.ask_with_reasoning(&self.store, s, p, o)
    }

    pub fn validate_node(&self, node: Id, shape_id: Id) -> ValidationResult {
        self.validator.validate_node(node, shape_id)
    }

    pub fn validate_batch(&self, pairs: &[(Id, Id)], cancel: Option<&CancellationToken>) -> Vec<ValidationResult> {
        self.validator.validate_batch(pairs, cancel, self.cancellation_poll_granularity)
    }

    pub fn validate_node_extended(&self, node: Id, shape_id: Id, ctx: ExtendedContext) -> ValidationResult {
        self.validator.validate_node_extended(&self.store, node, shape_id, ctx)
    }

    pub fn is_subclass_of(&self, a: Id, b: Id) -> bool {
        self.reasoner.is_subclass_of(a, b)
    }

    pub fn is_subproperty_of(&self, a: Id, b: Id) -> bool {
        self.reasoner.is_subproperty_of(a, b)
    }

    pub fn check_disjoint_violation(&self, s: Id) -> Option<(Id, Id)> {
        self.reasoner.check_disjoint_violation(&self.store, s)
    }

    pub fn subjects_with(&self, p: Id, o: Id) -> BitVector {
        JoinKernel::new(&self.store).subjects_with(p, o)
    }

    pub fn join_conjunctive(&self, patterns: &[kgc_join::SubjectPattern]) -> Vec<Id> {
        JoinKernel::new(&self.store).join_conjunctive(patterns)
    }

    pub fn intersect(a: &BitVector, b: &BitVector) -> BitVector {
        JoinKernel::intersect(a, b)
    }

    pub fn union(a: &BitVector, b: &BitVector) -> BitVector {
        JoinKernel::union(a, b)
    }

    pub fn difference(a: &BitVector, b: &BitVector) -> BitVector {
        JoinKernel::difference(a, b)
    }

    pub fn is_materialized(&self) -> bool {
        self.reasoner.is_materialized()
    }
}
