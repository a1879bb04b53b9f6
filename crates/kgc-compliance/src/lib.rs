//! A pure-function certifier: maps a declared engine schema to a footprint
//! breakdown in KiB, derives a cache tier from it, and issues a certificate
//! carrying that tier's latency/throughput guarantee. Allocates nothing —
//! the orchestrator consults this before constructing any engine, never
//! after.

mod footprint;
mod tier;

pub use footprint::{DeclaredSchema, FootprintBreakdown};
pub use tier::{Certificate, Tier};

pub fn certify(kernel_name: impl Into<String>, schema: &DeclaredSchema) -> Certificate {
    Certificate::for_breakdown(kernel_name, schema.footprint())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_tier_certification() {
        let schema = DeclaredSchema {
            num_classes: 200,
            num_properties: 50,
            num_shapes: 50,
            expected_subjects: 1000,
            expected_predicates: 10,
            expected_objects: 1000,
            use_object_index: true,
        };
        let cert = certify("s5", &schema);
        assert_eq!(cert.tier, Tier::L1);
        assert_eq!(cert.latency_envelope_ns, Some(10.0));
        assert_eq!(cert.throughput_envelope_ops_per_sec, Some(100.0e6));
        assert!(cert.breakdown.total_kib() <= Tier::L1_MAX_KIB);
        assert_eq!(cert.breakdown.object_subject_matrix_bytes, 0, "dense index replaces the bit-matrix");
    }

    #[test]
    fn without_object_index_uses_the_bit_matrix_instead() {
        let schema = DeclaredSchema {
            num_classes: 10,
            num_properties: 10,
            num_shapes: 1,
            expected_subjects: 100,
            expected_predicates: 5,
            expected_objects: 100,
            use_object_index: false,
        };
        let breakdown = schema.footprint();
        assert_eq!(breakdown.dense_predicate_object_index_bytes, 0);
        assert!(breakdown.object_subject_matrix_bytes > 0);
    }

    #[test]
    fn non_compliant_schema_has_no_envelope() {
        let schema = DeclaredSchema {
            num_classes: 100_000,
            num_properties: 100_000,
            num_shapes: 100_000,
            expected_subjects: 1_000_000,
            expected_predicates: 100_000,
            expected_objects: 1_000_000,
            use_object_index: false,
        };
        let cert = certify("oversized", &schema);
        assert_eq!(cert.tier, Tier::NonCompliant);
        assert_eq!(cert.latency_envelope_ns, None);
        assert_eq!(cert.throughput_envelope_ops_per_sec, None);
    }

    // Property 9: tier boundary exactness — a footprint at exactly a
    // threshold is compliant for that tier; one byte over is not.
    proptest::proptest! {
        #[test]
        fn tier_boundary_exactness(extra_bytes in 0u64..4096) {
            let at_boundary_kib = Tier::L1_MAX_KIB;
            let boundary_bytes = (at_boundary_kib * 1024.0) as u64;

            let at = Tier::from_total_kib(boundary_bytes as f64 / 1024.0);
            proptest::prop_assert_eq!(at, Tier::L1);

            if extra_bytes > 0 {
                let over = Tier::from_total_kib((boundary_bytes + extra_bytes) as f64 / 1024.0);
                proptest::prop_assert_ne!(over, Tier::L1);
            }
        }

        #[test]
        fn footprint_is_monotonic_in_schema_size(delta in 1u32..500) {
            let base = DeclaredSchema {
                num_classes: 50,
                num_properties: 50,
                num_shapes: 10,
                expected_subjects: 200,
                expected_predicates: 20,
                expected_objects: 200,
                use_object_index: true,
            };
            let mut grown = base;
            grown.expected_subjects += delta;
            proptest::prop_assert!(grown.footprint().total_bytes() >= base.footprint().total_bytes());
        }
    }
}
