// crates/canopy-engine/src/config.rs
//
// Engine configuration. Loaded from a TOML file or populated with defaults.

use std::collections::BTreeMap;
use std::fs;

use serde::{Deserialize, Serialize};

use canopy_core::{AttestationType, LockPolicy, SensitivityCategory};
use canopy_reach::trust_score::{DEFAULT_ENDORSEMENT_WEIGHT, DEFAULT_MAX_COUNTED_ENDORSEMENTS};
use canopy_reach::WeightedTrustPolicy;
use canopy_stewardship::RATIO_TOLERANCE;

/// Runtime configuration for the governance engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Allowed deviation from 1.0 for the stewardship ratio sum.
    #[serde(default = "default_ratio_tolerance")]
    pub ratio_tolerance: f64,

    /// Behaviour of a writer that finds its content id locked: "wait" or "fail-fast".
    #[serde(default)]
    pub lock_policy: LockPolicy,

    /// Trust score weighting.
    #[serde(default)]
    pub trust: TrustConfig,

    /// Template category used when profile instantiation names none.
    #[serde(default)]
    pub default_category: SensitivityCategory,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Overrides for the weighted trust score policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Per attestation type, e.g. `peer-reviewed = 0.5`. Unlisted types keep their default.
    #[serde(default)]
    pub weights: BTreeMap<AttestationType, f64>,

    #[serde(default = "default_endorsement_weight")]
    pub endorsement_weight: f64,

    #[serde(default = "default_max_counted_endorsements")]
    pub max_counted_endorsements: u32,
}

fn default_ratio_tolerance() -> f64 {
    RATIO_TOLERANCE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_endorsement_weight() -> f64 {
    DEFAULT_ENDORSEMENT_WEIGHT
}

fn default_max_counted_endorsements() -> u32 {
    DEFAULT_MAX_COUNTED_ENDORSEMENTS
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            weights: BTreeMap::new(),
            endorsement_weight: default_endorsement_weight(),
            max_counted_endorsements: default_max_counted_endorsements(),
        }
    }
}

impl TrustConfig {
    /// The trust policy these settings describe.
    pub fn policy(&self) -> WeightedTrustPolicy {
        let base = WeightedTrustPolicy {
            endorsement_weight: self.endorsement_weight,
            max_counted_endorsements: self.max_counted_endorsements,
            ..WeightedTrustPolicy::default()
        };
        self.weights
            .iter()
            .fold(base, |policy, (kind, weight)| policy.with_weight(*kind, *weight))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ratio_tolerance: default_ratio_tolerance(),
            lock_policy: LockPolicy::default(),
            trust: TrustConfig::default(),
            default_category: SensitivityCategory::default(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file at the given path. A leading `~/`
    /// expands to the home directory.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: EngineConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default config location: `~/.canopy/config.toml`.
    pub fn default_path() -> String {
        "~/.canopy/config.toml".to_string()
    }
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).display().to_string();
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_reach::TrustScorePolicy;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.ratio_tolerance, 1e-6);
        assert_eq!(config.lock_policy, LockPolicy::Wait);
    }

    #[test]
    fn test_parse_full_config() {
        let config: EngineConfig = toml::from_str(
            r#"
            ratio_tolerance = 1e-4
            lock_policy = "fail-fast"
            default_category = "educational"
            log_level = "debug"

            [trust]
            endorsement_weight = 0.05
            max_counted_endorsements = 10

            [trust.weights]
            peer-reviewed = 0.6
            "#,
        )
        .unwrap();
        assert_eq!(config.lock_policy, LockPolicy::FailFast);
        assert_eq!(config.default_category, SensitivityCategory::Educational);
        let policy = config.trust.policy();
        assert_eq!(policy.weight_for(AttestationType::PeerReviewed), 0.6);
        assert_eq!(policy.weight_for(AttestationType::GovernanceRatified), 0.85);
        assert_eq!(policy.max_counted_endorsements, 10);
        assert!(policy.score(&[], 10) > 0.0);
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(EngineConfig::load("/nonexistent/canopy/config.toml").is_err());
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/etc/canopy.toml"), "/etc/canopy.toml");
    }
}
