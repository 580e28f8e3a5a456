// crates/canopy-reach/src/trust_score.rs
//
// Trust score policies for the Canopy reach resolver.
//
// A trust score is a bounded [0.0, 1.0] confidence aggregate over a content
// item's active attestations and endorsements. The weighting is a policy
// decision, so it sits behind a trait; the resolver only relies on the score
// being bounded and monotone (more attestations or endorsements never lower it).

use std::collections::BTreeMap;

use canopy_core::{Attestation, AttestationType};

/// Computes a trust score from active attestations.
pub trait TrustScorePolicy: Send + Sync + std::fmt::Debug {
    /// Score the given active attestations plus an endorsement count.
    ///
    /// Must return a value in [0.0, 1.0] and must be monotone non-decreasing
    /// in both the attestation multiset and the endorsement count.
    fn score(&self, active: &[&Attestation], endorsements: u32) -> f64;
}

/// Default policy: per-type weights combined as a noisy-OR.
///
/// score = 1 - (prod over attestations of (1 - w_type)) * (1 - w_endorse)^min(e, cap)
///
/// Each independent piece of evidence closes part of the remaining gap to
/// 1.0, so the score rises with every attestation but never exceeds 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTrustPolicy {
    /// Weight per attestation type, each in [0.0, 1.0].
    pub weights: BTreeMap<AttestationType, f64>,
    /// Weight for types absent from `weights`.
    pub default_weight: f64,
    /// Weight contributed by each endorsement.
    pub endorsement_weight: f64,
    /// Endorsements beyond this count add nothing.
    pub max_counted_endorsements: u32,
}

/// Default per-type weights.
pub const DEFAULT_WEIGHTS: [(AttestationType, f64); 10] = [
    (AttestationType::AuthorVerified, 0.1),
    (AttestationType::StewardApproved, 0.3),
    (AttestationType::CommunityEndorsed, 0.2),
    (AttestationType::PeerReviewed, 0.4),
    (AttestationType::GovernanceRatified, 0.85),
    (AttestationType::CurriculumCanonical, 0.85),
    (AttestationType::SafetyReviewed, 0.2),
    (AttestationType::AccuracyVerified, 0.3),
    (AttestationType::AccessibilityChecked, 0.1),
    (AttestationType::LicenseCleared, 0.2),
];

/// Default weight of a single endorsement.
pub const DEFAULT_ENDORSEMENT_WEIGHT: f64 = 0.02;

/// Default cap on counted endorsements.
pub const DEFAULT_MAX_COUNTED_ENDORSEMENTS: u32 = 25;

impl WeightedTrustPolicy {
    /// Override the weight for one attestation type. Values are clamped to [0.0, 1.0].
    pub fn with_weight(mut self, attestation_type: AttestationType, weight: f64) -> Self {
        self.weights.insert(attestation_type, clamp_unit(weight));
        self
    }

    /// Weight used for `attestation_type`.
    pub fn weight_for(&self, attestation_type: AttestationType) -> f64 {
        self.weights
            .get(&attestation_type)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

impl Default for WeightedTrustPolicy {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.into_iter().collect(),
            default_weight: 0.1,
            endorsement_weight: DEFAULT_ENDORSEMENT_WEIGHT,
            max_counted_endorsements: DEFAULT_MAX_COUNTED_ENDORSEMENTS,
        }
    }
}

impl TrustScorePolicy for WeightedTrustPolicy {
    fn score(&self, active: &[&Attestation], endorsements: u32) -> f64 {
        let mut remaining_doubt = 1.0_f64;
        for attestation in active {
            remaining_doubt *= 1.0 - clamp_unit(self.weight_for(attestation.attestation_type));
        }

        let counted = endorsements.min(self.max_counted_endorsements);
        let endorsement_doubt = 1.0 - clamp_unit(self.endorsement_weight);
        remaining_doubt *= endorsement_doubt.powi(i32::try_from(counted).unwrap_or(i32::MAX));

        clamp_unit(1.0 - remaining_doubt)
    }
}

/// Clamp to [0.0, 1.0], mapping NaN to 0.0.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
