use crate::shape::{CompiledShape, ConstraintFlags, PropertyPath};
use kgc_bitmatrix::{BitMatrix, BitVector, CancellationToken};
use kgc_ids::{check_in_range, Id, KgError, Sort};
use kgc_store::TripleStore;
use tracing::debug_span;

/// How deep a logical combinator (`sh:and`/`sh:or`/`sh:not`/`sh:xone`) may
/// recurse through sub-shapes before validation gives up rather than risk
/// an authoring cycle spinning forever.
const MAX_LOGICAL_DEPTH: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    UnknownShape,
    MissingRequiredProperty,
    CardinalityOutOfBounds,
    DatatypeMismatch,
    NotInLiteralSet,
    LengthOutOfBounds,
    NumericOutOfBounds,
    LogicalCombinatorFailed,
    PropertyPathUnsatisfied,
    MaxRecursionDepthExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    /// The node satisfies every live constraint of the shape.
    Valid,
    /// The node's class row does not intersect the shape's target class
    /// mask — the shape simply does not apply to this node.
    NotTargeted,
    Invalid { reason: InvalidReason },
}

impl ValidationResult {
    /// The boolean projection used by the scenario-level `validate(node,
    /// shape)` surface: both "satisfied" and "not targeted" read as `true`.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid | ValidationResult::NotTargeted)
    }
}

/// Extra per-call inputs the extended-constraint routine needs but the core
/// store does not hold: this engine carries no literal values, so length
/// and numeric bounds are checked against a scalar the caller already
/// resolved (e.g. from an external literal table).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedContext {
    pub scalar: Option<i64>,
    pub max_path_hops: u32,
}

/// Owns the node-class / node-property / node-datatype mirror matrices and
/// the compiled shape table. `register_shape`/`set_class`/`set_property`/
/// `set_datatype` are mutation-phase; `validate_node`/`validate_node_extended`
/// are query-phase and take `&self` only.
pub struct ShapeValidator {
    max_nodes: u32,
    max_classes: u32,
    max_properties: u32,
    max_datatypes: u32,
    node_class: BitMatrix,
    node_property: BitMatrix,
    node_datatype: BitMatrix,
    shapes: Vec<Option<CompiledShape>>,
}

impl ShapeValidator {
    pub fn create(
        max_nodes: u32,
        max_classes: u32,
        max_properties: u32,
        max_datatypes: u32,
        max_shapes: u32,
    ) -> Result<Self, KgError> {
        Ok(Self {
            max_nodes,
            max_classes,
            max_properties,
            max_datatypes,
            node_class: BitMatrix::try_new(max_nodes as usize, max_classes as usize)?,
            node_property: BitMatrix::try_new(max_nodes as usize, max_properties as usize)?,
            node_datatype: BitMatrix::try_new(max_nodes as usize, max_datatypes as usize)?,
            shapes: (0..max_shapes).map(|_| None).collect(),
        })
    }

    #[inline]
    pub fn max_nodes(&self) -> u32 {
        self.max_nodes
    }

    pub fn set_class(&mut self, node: Id, class: Id) -> Result<(), KgError> {
        check_in_range(Sort::Subject, node, self.max_nodes)?;
        check_in_range(Sort::Class, class, self.max_classes)?;
        self.node_class.set(node as usize, class as usize);
        Ok(())
    }

    pub fn set_property(&mut self, node: Id, property: Id) -> Result<(), KgError> {
        check_in_range(Sort::Subject, node, self.max_nodes)?;
        check_in_range(Sort::Property, property, self.max_properties)?;
        self.node_property.set(node as usize, property as usize);
        Ok(())
    }

    pub fn set_datatype(&mut self, node: Id, datatype: Id) -> Result<(), KgError> {
        check_in_range(Sort::Subject, node, self.max_nodes)?;
        check_in_range(Sort::Object, datatype, self.max_datatypes)?;
        self.node_datatype.set(node as usize, datatype as usize);
        Ok(())
    }

    pub fn register_shape(&mut self, shape_id: Id, shape: CompiledShape) -> Result<(), KgError> {
        let _span = debug_span!("register_shape", shape_id).entered();
        let slot = self.shapes.get_mut(shape_id as usize).ok_or(KgError::OutOfRange {
            sort: Sort::Shape,
            id: shape_id,
            capacity: self.shapes.len() as u32,
        })?;
        *slot = Some(shape);
        Ok(())
    }

    fn shape(&self, shape_id: Id) -> Option<&CompiledShape> {
        self.shapes.get(shape_id as usize).and_then(|s| s.as_ref())
    }

    /// The hot path: load the shape, test the node's class row against the
    /// target-class mask (zero intersection means the shape does not apply
    /// — valid by default), then test the node's property row is a superset
    /// of the required-property mask. Never touches the extended routine;
    /// callers check [`CompiledShape::has_extended_constraints`] themselves
    /// before reaching for [`Self::validate_node_extended`].
    pub fn validate_node(&self, node: Id, shape_id: Id) -> ValidationResult {
        let Some(shape) = self.shape(shape_id) else {
            return ValidationResult::Invalid { reason: InvalidReason::UnknownShape };
        };
        if node >= self.max_nodes {
            return ValidationResult::Valid;
        }
        if !self.node_class.row_intersects(node as usize, &shape.target_class_mask, 0) {
            return ValidationResult::NotTargeted;
        }
        if !self.node_property.row_and_equals(node as usize, &shape.required_property_mask, 0) {
            return ValidationResult::Invalid { reason: InvalidReason::MissingRequiredProperty };
        }
        ValidationResult::Valid
    }

    /// Four independent [`Self::validate_node`] calls, laid out so the
    /// class/property row loads of each pair are data-independent within a
    /// group — functionally identical to four sequential calls.
    ///
    /// `cancel`, when given, is polled every `poll_granularity` groups (§5
    /// "checked between batched-validation groups"). A cancellation mid-way
    /// returns the results accumulated so far, shorter than `pairs` — query
    /// phase, so it stops early rather than failing.
    pub fn validate_batch(
        &self,
        pairs: &[(Id, Id)],
        cancel: Option<&CancellationToken>,
        poll_granularity: u32,
    ) -> Vec<ValidationResult> {
        let granularity = poll_granularity.max(1) as usize;
        let mut out = Vec::with_capacity(pairs.len());
        for (group_idx, group) in pairs.chunks(4).enumerate() {
            if group_idx % granularity == 0 && cancel.is_some_and(CancellationToken::is_cancelled) {
                break;
            }
            for &(node, shape_id) in group {
                out.push(self.validate_node(node, shape_id));
            }
        }
        out
    }

    /// Runs the hot path, then — if it passed and the shape carries
    /// extended constraints — the cardinality/datatype/literal-in-set/
    /// length/numeric/logical/property-path checks in turn, short-circuiting
    /// on the first violation.
    pub fn validate_node_extended(
        &self,
        store: &TripleStore,
        node: Id,
        shape_id: Id,
        ctx: ExtendedContext,
    ) -> ValidationResult {
        self.validate_node_extended_at_depth(store, node, shape_id, ctx, 0)
    }

    fn validate_node_extended_at_depth(
        &self,
        store: &TripleStore,
        node: Id,
        shape_id: Id,
        ctx: ExtendedContext,
        depth: u32,
    ) -> ValidationResult {
        let base = self.validate_node(node, shape_id);
        if !matches!(base, ValidationResult::Valid) {
            return base;
        }
        // validate_node already proved shape_id resolves.
        let shape = self.shape(shape_id).expect("shape resolved by validate_node");
        if !shape.has_extended_constraints() {
            return ValidationResult::Valid;
        }
        if depth > MAX_LOGICAL_DEPTH {
            return ValidationResult::Invalid { reason: InvalidReason::MaxRecursionDepthExceeded };
        }

        if shape.flags.contains(ConstraintFlags::CARDINALITY) {
            if let Some(bound) = &shape.cardinality {
                let degree = store.degree(node, bound.property);
                if degree < bound.min || degree > bound.max {
                    return ValidationResult::Invalid { reason: InvalidReason::CardinalityOutOfBounds };
                }
            }
        }

        if shape.flags.contains(ConstraintFlags::DATATYPE) {
            if let Some(mask) = &shape.datatype_mask {
                if !self.node_datatype.row_intersects(node as usize, mask, 0) {
                    return ValidationResult::Invalid { reason: InvalidReason::DatatypeMismatch };
                }
            }
        }

        if shape.flags.contains(ConstraintFlags::LITERAL_IN_SET) {
            if let (Some(mask), Some(property)) = (&shape.literal_in_set_mask, shape.literal_in_set_property) {
                let head = store.object_list(node, property).head();
                let in_set = head.is_some_and(|o| mask.test(0, o as usize));
                if !in_set {
                    return ValidationResult::Invalid { reason: InvalidReason::NotInLiteralSet };
                }
            }
        }

        if shape.flags.contains(ConstraintFlags::LENGTH) {
            if let Some((min, max)) = shape.length_bounds {
                let ok = matches!(ctx.scalar, Some(v) if v >= 0 && (v as u64) >= min as u64 && (v as u64) <= max as u64);
                if !ok {
                    return ValidationResult::Invalid { reason: InvalidReason::LengthOutOfBounds };
                }
            }
        }

        if shape.flags.contains(ConstraintFlags::NUMERIC) {
            if let Some((min, max)) = shape.numeric_bounds {
                let ok = matches!(ctx.scalar, Some(v) if v >= min && v <= max);
                if !ok {
                    return ValidationResult::Invalid { reason: InvalidReason::NumericOutOfBounds };
                }
            }
        }

        if shape.flags.contains(ConstraintFlags::LOGICAL) {
            if !self.eval_logical(store, node, shape_id, ctx, depth) {
                return ValidationResult::Invalid { reason: InvalidReason::LogicalCombinatorFailed };
            }
        }

        if shape.flags.contains(ConstraintFlags::PROPERTY_PATH) {
            if let Some(path) = &shape.property_path {
                if !self.eval_property_path(store, node, path, ctx.max_path_hops) {
                    return ValidationResult::Invalid { reason: InvalidReason::PropertyPathUnsatisfied };
                }
            }
        }

        ValidationResult::Valid
    }

    fn eval_logical(&self, store: &TripleStore, node: Id, shape_id: Id, ctx: ExtendedContext, depth: u32) -> bool {
        let shape = self.shape(shape_id).expect("shape resolved by caller");
        let combo = &shape.logical;
        let check = |sid: Id| {
            self.validate_node_extended_at_depth(store, node, sid, ctx, depth + 1).is_valid()
        };
        let and_ok = combo.and.iter().all(|&sid| check(sid));
        let or_ok = combo.or.is_empty() || combo.or.iter().any(|&sid| check(sid));
        let not_ok = combo.not.iter().all(|&sid| !check(sid));
        let xone_ok = combo.xone.is_empty() || combo.xone.iter().filter(|&&sid| check(sid)).count() == 1;
        and_ok && or_ok && not_ok && xone_ok
    }

    /// Evaluates `path` from `node` against the store's predicate/object
    /// matrices, returning whether any node is reachable. `max_hops` bounds
    /// the fixed-point iteration of `*`/`+`, guaranteeing termination on a
    /// cyclic graph.
    pub(crate) fn eval_property_path(&self, store: &TripleStore, node: Id, path: &PropertyPath, max_hops: u32) -> bool {
        let mut frontier = BitVector::new(self.max_nodes as usize);
        if (node as u32) < self.max_nodes {
            frontier.set(node as usize);
        }
        let reached = self.expand_path(store, &frontier, path, max_hops);
        !reached.is_empty()
    }

    fn expand_path(&self, store: &TripleStore, frontier: &BitVector, path: &PropertyPath, hops_left: u32) -> BitVector {
        match path {
            PropertyPath::Predicate(p) => self.step_forward(store, frontier, *p),
            PropertyPath::Inverse(p) => self.step_backward(store, frontier, *p),
            PropertyPath::Sequence(a, b) => {
                let mid = self.expand_path(store, frontier, a, hops_left);
                self.expand_path(store, &mid, b, hops_left)
            }
            PropertyPath::Alternative(a, b) => {
                let ra = self.expand_path(store, frontier, a, hops_left);
                let rb = self.expand_path(store, frontier, b, hops_left);
                ra.union(&rb)
            }
            PropertyPath::ZeroOrOne(inner) => {
                let r = self.expand_path(store, frontier, inner, hops_left);
                frontier.union(&r)
            }
            PropertyPath::OneOrMore(inner) => {
                let mut acc = self.expand_path(store, frontier, inner, hops_left);
                let mut hops = hops_left.saturating_sub(1);
                loop {
                    if hops == 0 {
                        break;
                    }
                    let next = self.expand_path(store, &acc, inner, hops_left);
                    let merged = acc.union(&next);
                    if merged.popcount() == acc.popcount() {
                        break;
                    }
                    acc = merged;
                    hops -= 1;
                }
                acc
            }
            PropertyPath::ZeroOrMore(inner) => {
                let plus = self.expand_path(store, frontier, &PropertyPath::OneOrMore(inner.clone()), hops_left);
                frontier.union(&plus)
            }
        }
    }

    fn step_forward(&self, store: &TripleStore, frontier: &BitVector, predicate: Id) -> BitVector {
        let mut out = BitVector::new(self.max_nodes as usize);
        for s in frontier.iter_set_bits() {
            for o in store.object_list(s as Id, predicate).iter() {
                if (o as u32) < self.max_nodes {
                    out.set(o as usize);
                }
            }
        }
        out
    }

    fn step_backward(&self, store: &TripleStore, frontier: &BitVector, predicate: Id) -> BitVector {
        let mut out = BitVector::new(self.max_nodes as usize);
        for o in frontier.iter_set_bits() {
            let matches = store
                .predicate_subject_matrix()
                .and_row_with(predicate as usize, store.object_subject_matrix(), o);
            out = out.union(&matches);
        }
        out
    }
}
