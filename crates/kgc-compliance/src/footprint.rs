/// Byte footprint of one declared matrix or vector, broken out by the piece
/// of the engine that owns it. `object_subject_matrix_bytes` and
/// `dense_predicate_object_index_bytes` are mutually exclusive: a schema
/// either carries the bit-matrix or the dense index for predicate/subject to
/// object lookups, never both, so exactly one of the two is nonzero for any
/// given [`DeclaredSchema`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FootprintBreakdown {
    pub subclass_closure_bytes: u64,
    pub property_vector_bytes: u64,
    pub shape_footprint_bytes: u64,
    pub predicate_subject_matrix_bytes: u64,
    pub object_subject_matrix_bytes: u64,
    pub dense_predicate_object_index_bytes: u64,
}

impl FootprintBreakdown {
    pub fn total_bytes(&self) -> u64 {
        self.subclass_closure_bytes
            + self.property_vector_bytes
            + self.shape_footprint_bytes
            + self.predicate_subject_matrix_bytes
            + self.object_subject_matrix_bytes
            + self.dense_predicate_object_index_bytes
    }

    pub fn total_kib(&self) -> f64 {
        self.total_bytes() as f64 / 1024.0
    }
}

/// `⌈bits / 64⌉`, the certifier's own row-width arithmetic. Deliberately
/// *not* rounded up further to the bit-matrix allocator's 64-byte block
/// stride: the certifier is a declared-shape estimate, the allocator's
/// block padding is a real-allocation implementation detail, and the gap
/// between the two (at most 7 words per row) only ever makes a certified
/// tier a conservative lower bound on the true allocation, never an
/// overstatement.
fn words_for(n: u32) -> u64 {
    (n.max(1) as u64).div_ceil(64)
}

/// The declared shape of an engine deployment — the input a caller supplies
/// to ask "would this schema be compliant" before paying to construct it.
#[derive(Debug, Clone, Copy)]
pub struct DeclaredSchema {
    pub num_classes: u32,
    pub num_properties: u32,
    pub num_shapes: u32,
    pub expected_subjects: u32,
    pub expected_predicates: u32,
    pub expected_objects: u32,
    pub use_object_index: bool,
}

/// Number of property-characteristic vectors tracked per property:
/// transitive, symmetric, functional, inverse_functional.
const PROPERTY_CHARACTERISTIC_VECTORS: u64 = 4;

impl DeclaredSchema {
    pub fn footprint(&self) -> FootprintBreakdown {
        let subclass_closure_bytes = self.num_classes as u64 * words_for(self.num_classes) * 8;
        let property_vector_bytes = PROPERTY_CHARACTERISTIC_VECTORS * words_for(self.num_properties) * 8;

        // Mask arrays per shape: one target-class-mask row plus one
        // required-property-mask row (§3's "shape footprint includes mask
        // arrays").
        let shape_words = words_for(self.num_classes) + words_for(self.num_properties);
        let shape_footprint_bytes = self.num_shapes as u64 * shape_words * 8;

        let predicate_subject_matrix_bytes =
            self.expected_predicates as u64 * words_for(self.expected_subjects) * 8;

        let (object_subject_matrix_bytes, dense_predicate_object_index_bytes) = if self.use_object_index {
            (0, self.expected_predicates as u64 * self.expected_subjects as u64 * 4)
        } else {
            (self.expected_objects as u64 * words_for(self.expected_subjects) * 8, 0)
        };

        FootprintBreakdown {
            subclass_closure_bytes,
            property_vector_bytes,
            shape_footprint_bytes,
            predicate_subject_matrix_bytes,
            object_subject_matrix_bytes,
            dense_predicate_object_index_bytes,
        }
    }
}
