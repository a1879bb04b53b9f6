use crate::footprint::FootprintBreakdown;

/// Cache tier thresholds, in KiB, and the latency/throughput envelope each
/// one certifies a compliant deployment for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Tier {
    /// Fits in L1: total footprint <= 64 KiB, <= 10ns per operation.
    L1,
    /// Fits in L2: total footprint <= 512 KiB, <= 30ns per operation.
    L2,
    /// Fits in L3: total footprint <= 16384 KiB, <= 100ns per operation.
    L3,
    /// Exceeds every tier's working-set bound; no latency envelope is
    /// certified.
    NonCompliant,
}

impl Tier {
    pub const L1_MAX_KIB: f64 = 64.0;
    pub const L2_MAX_KIB: f64 = 512.0;
    pub const L3_MAX_KIB: f64 = 16_384.0;

    pub const L1_LATENCY_NS: f64 = 10.0;
    pub const L2_LATENCY_NS: f64 = 30.0;
    pub const L3_LATENCY_NS: f64 = 100.0;

    pub fn from_total_kib(total_kib: f64) -> Tier {
        if total_kib <= Self::L1_MAX_KIB {
            Tier::L1
        } else if total_kib <= Self::L2_MAX_KIB {
            Tier::L2
        } else if total_kib <= Self::L3_MAX_KIB {
            Tier::L3
        } else {
            Tier::NonCompliant
        }
    }

    pub fn latency_envelope_ns(&self) -> Option<f64> {
        match self {
            Tier::L1 => Some(Self::L1_LATENCY_NS),
            Tier::L2 => Some(Self::L2_LATENCY_NS),
            Tier::L3 => Some(Self::L3_LATENCY_NS),
            Tier::NonCompliant => None,
        }
    }

    /// Named per tier, not derived from the latency figure — §4.5 states
    /// both guarantees independently, and L2's throughput figure (30
    /// Mops/s) is not `1/30ns`.
    pub fn throughput_envelope_ops_per_sec(&self) -> Option<f64> {
        match self {
            Tier::L1 => Some(100.0e6),
            Tier::L2 => Some(30.0e6),
            Tier::L3 => Some(10.0e6),
            Tier::NonCompliant => None,
        }
    }
}

/// The certifier's output: a declared kernel's footprint, the tier it
/// qualifies for, and the envelope that tier certifies. Pure data — no
/// timestamp is stamped here, since this crate cannot call `SystemTime::now`
/// from inside a workflow-replay-safe context; callers stamp one themselves.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Certificate {
    pub kernel_name: String,
    pub breakdown: FootprintBreakdown,
    pub tier: Tier,
    pub latency_envelope_ns: Option<f64>,
    pub throughput_envelope_ops_per_sec: Option<f64>,
}

impl Certificate {
    pub fn for_breakdown(kernel_name: impl Into<String>, breakdown: FootprintBreakdown) -> Self {
        let tier = Tier::from_total_kib(breakdown.total_kib());
        Self {
            kernel_name: kernel_name.into(),
            latency_envelope_ns: tier.latency_envelope_ns(),
            throughput_envelope_ops_per_sec: tier.throughput_envelope_ops_per_sec(),
            breakdown,
            tier,
        }
    }
}
