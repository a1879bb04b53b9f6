use kgc_bitmatrix::BitMatrix;
use kgc_ids::Id;

bitflags::bitflags! {
    /// Which of a shape's optional constraints are live. `TARGET_CLASS` and
    /// `REQUIRED_PROPERTY` are implicitly always checked by the hot path;
    /// this flag set only gates the extended-constraint routine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConstraintFlags: u32 {
        const CARDINALITY    = 1 << 0;
        const DATATYPE       = 1 << 1;
        const LITERAL_IN_SET = 1 << 2;
        const LENGTH         = 1 << 3;
        const NUMERIC        = 1 << 4;
        const LOGICAL        = 1 << 5;
        const PROPERTY_PATH  = 1 << 6;
    }
}

/// Cardinality bound on one focus property: `s` must have between `min` and
/// `max` distinct objects under `property`.
#[derive(Debug, Clone, Copy)]
pub struct CardinalityBound {
    pub property: Id,
    pub min: u32,
    pub max: u32,
}

/// `sh:and` / `sh:or` / `sh:not` / `sh:xone`, each a list of shape ids
/// evaluated against the same focus node. Empty lists are vacuously
/// satisfied (`and`/`xone` on an empty list would be a shape-authoring bug,
/// not something this validator rejects).
#[derive(Debug, Clone, Default)]
pub struct LogicalCombinators {
    pub and: Vec<Id>,
    pub or: Vec<Id>,
    pub not: Vec<Id>,
    pub xone: Vec<Id>,
}

impl LogicalCombinators {
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty() && self.not.is_empty() && self.xone.is_empty()
    }
}

/// A property-path expression, evaluated over the store's predicate/object
/// matrices by the join kernel. Recursive variants are boxed to keep
/// [`CompiledShape`] a fixed, cheap-to-clone size at the non-recursive
/// common case (a bare predicate).
#[derive(Debug, Clone)]
pub enum PropertyPath {
    Predicate(Id),
    Inverse(Id),
    Sequence(Box<PropertyPath>, Box<PropertyPath>),
    Alternative(Box<PropertyPath>, Box<PropertyPath>),
    ZeroOrMore(Box<PropertyPath>),
    OneOrMore(Box<PropertyPath>),
    ZeroOrOne(Box<PropertyPath>),
}

/// A compiled shape: a fixed-size bitmask record plus the optional extended
/// constraints, resolved once at registration time so `validate_node` never
/// parses anything.
pub struct CompiledShape {
    pub target_class_mask: BitMatrix,
    pub required_property_mask: BitMatrix,
    pub datatype_mask: Option<BitMatrix>,
    pub cardinality: Option<CardinalityBound>,
    pub literal_in_set_mask: Option<BitMatrix>,
    pub literal_in_set_property: Option<Id>,
    pub length_bounds: Option<(u32, u32)>,
    pub numeric_bounds: Option<(i64, i64)>,
    pub logical: LogicalCombinators,
    pub property_path: Option<PropertyPath>,
    pub flags: ConstraintFlags,
}

impl CompiledShape {
    /// A shape with only the always-on target-class / required-property
    /// checks live — the common case, and the one the hot path alone
    /// suffices for.
    pub fn basic(target_class_mask: BitMatrix, required_property_mask: BitMatrix) -> Self {
        Self {
            target_class_mask,
            required_property_mask,
            datatype_mask: None,
            cardinality: None,
            literal_in_set_mask: None,
            literal_in_set_property: None,
            length_bounds: None,
            numeric_bounds: None,
            logical: LogicalCombinators::default(),
            property_path: None,
            flags: ConstraintFlags::empty(),
        }
    }

    pub fn has_extended_constraints(&self) -> bool {
        !self.flags.is_empty()
    }
}
