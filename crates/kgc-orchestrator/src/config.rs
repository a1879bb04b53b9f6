use kgc_ids::KgError;
use serde::Deserialize;

/// Capacities and tuning knobs fixed at engine construction. Loadable from
/// TOML; this is the only place on disk this workspace ever touches — it
/// sizes engines, it does not persist triples (construction-time sizing
/// does not reintroduce the "no persistence" non-goal).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_subjects: u32,
    pub max_predicates: u32,
    pub max_objects: u32,
    pub max_classes: u32,
    pub max_properties: u32,
    pub max_shapes: u32,
    pub max_datatypes: u32,
    pub rdf_type_predicate: u32,
    /// Target tier the certifier is expected to confirm; construction does
    /// not fail if the declared schema misses it, it only gets logged —
    /// the certifier's verdict is informational for `from_config` callers,
    /// not a hard precondition on engine construction.
    pub target_tier: TargetTier,
    /// How many Warshall pivots / batch groups run between
    /// `CancellationToken` checks.
    pub cancellation_poll_granularity: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTier {
    L1,
    #[default]
    L2,
    L3,
    Any,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_subjects: 1_000,
            max_predicates: 64,
            max_objects: 1_000,
            max_classes: 64,
            max_properties: 64,
            max_shapes: 32,
            max_datatypes: 16,
            rdf_type_predicate: 0,
            target_tier: TargetTier::L2,
            cancellation_poll_granularity: 1,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, KgError> {
        toml::from_str(src).map_err(|e| KgError::InvalidConfig {
            detail: format!("config parse error: {e}"),
        })
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, KgError> {
        let content = std::fs::read_to_string(path).map_err(|e| KgError::InvalidConfig {
            detail: format!("config read error: {e}"),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn declared_schema(&self, use_object_index: bool) -> kgc_compliance::DeclaredSchema {
        kgc_compliance::DeclaredSchema {
            num_classes: self.max_classes,
            num_properties: self.max_properties,
            num_shapes: self.max_shapes,
            expected_subjects: self.max_subjects,
            expected_predicates: self.max_predicates,
            expected_objects: self.max_objects,
            use_object_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.target_tier, TargetTier::L2);
        assert_eq!(cfg.cancellation_poll_granularity, 1);
    }

    #[test]
    fn parses_partial_toml_over_defaults() {
        let cfg = EngineConfig::from_toml_str("max_subjects = 5000\ntarget_tier = \"l1\"\n").unwrap();
        assert_eq!(cfg.max_subjects, 5000);
        assert_eq!(cfg.target_tier, TargetTier::L1);
        assert_eq!(cfg.max_predicates, 64, "unspecified fields keep their defaults");
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(EngineConfig::from_toml_str("max_subjects = [not valid").is_err());
    }
}
