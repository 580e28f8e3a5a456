// crates/canopy-reach/src/requirements.rs
//
// Reach requirement predicates: what a content item must show before it may
// be discovered at a given reach level.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use canopy_core::{AttestationType, FlagType, ReachLevel, RequirementMode};

/// Slack allowed when comparing a computed trust score against a threshold.
pub const SCORE_EPSILON: f64 = 1e-9;

/// A set of attestation types plus an explicit composition mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRequirement {
    pub mode: RequirementMode,
    pub types: BTreeSet<AttestationType>,
}

impl AttestationRequirement {
    pub fn any_of(types: impl IntoIterator<Item = AttestationType>) -> Self {
        Self {
            mode: RequirementMode::AnyOf,
            types: types.into_iter().collect(),
        }
    }

    pub fn all_of(types: impl IntoIterator<Item = AttestationType>) -> Self {
        Self {
            mode: RequirementMode::AllOf,
            types: types.into_iter().collect(),
        }
    }

    /// Whether `present` satisfies the requirement. An empty requirement is
    /// satisfied by anything.
    pub fn is_satisfied_by(&self, present: &BTreeSet<AttestationType>) -> bool {
        if self.types.is_empty() {
            return true;
        }
        match self.mode {
            RequirementMode::AnyOf => self.types.iter().any(|t| present.contains(t)),
            RequirementMode::AllOf => self.types.is_subset(present),
        }
    }
}

/// Everything a requirement predicate is evaluated against.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReachEvidence {
    /// Types of the active, unexpired, unrevoked attestations.
    pub active_types: BTreeSet<AttestationType>,
    pub trust_score: f64,
    pub endorsements: u32,
    pub open_flags: BTreeSet<FlagType>,
}

/// Why a level's requirement was not met.
#[derive(Debug, Clone, PartialEq)]
pub enum ReachShortfall {
    /// The table has no entry for the level.
    Undefined,
    MissingAttestations { mode: RequirementMode, types: BTreeSet<AttestationType> },
    TrustScoreBelow { required: f64, actual: f64 },
    EndorsementsBelow { required: u32, actual: u32 },
    BlockedByFlags(BTreeSet<FlagType>),
}

/// Requirement predicate for a single reach level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachRequirement {
    pub level: ReachLevel,
    #[serde(default)]
    pub attestations: AttestationRequirement,
    #[serde(default)]
    pub min_trust_score: f64,
    #[serde(default)]
    pub min_endorsements: u32,
    /// Open flags of these types disqualify the level.
    #[serde(default)]
    pub forbidden_flags: BTreeSet<FlagType>,
}

impl ReachRequirement {
    /// A requirement nothing can fail.
    pub fn open(level: ReachLevel) -> Self {
        Self {
            level,
            attestations: AttestationRequirement::default(),
            min_trust_score: 0.0,
            min_endorsements: 0,
            forbidden_flags: BTreeSet::new(),
        }
    }

    /// Evaluate the predicate. Checks run in a fixed order and the first
    /// failure is reported.
    pub fn evaluate(&self, evidence: &ReachEvidence) -> Result<(), ReachShortfall> {
        if !self.attestations.is_satisfied_by(&evidence.active_types) {
            return Err(ReachShortfall::MissingAttestations {
                mode: self.attestations.mode,
                types: self
                    .attestations
                    .types
                    .difference(&evidence.active_types)
                    .copied()
                    .collect(),
            });
        }
        if evidence.trust_score + SCORE_EPSILON < self.min_trust_score {
            return Err(ReachShortfall::TrustScoreBelow {
                required: self.min_trust_score,
                actual: evidence.trust_score,
            });
        }
        if evidence.endorsements < self.min_endorsements {
            return Err(ReachShortfall::EndorsementsBelow {
                required: self.min_endorsements,
                actual: evidence.endorsements,
            });
        }
        let blocking: BTreeSet<FlagType> = self
            .forbidden_flags
            .intersection(&evidence.open_flags)
            .copied()
            .collect();
        if !blocking.is_empty() {
            return Err(ReachShortfall::BlockedByFlags(blocking));
        }
        Ok(())
    }
}

/// Requirement predicates for every reach level.
///
/// `private` is always satisfiable; a level missing from the table is never
/// satisfiable, so resolution can only fall back toward `private`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachRequirementTable {
    requirements: BTreeMap<ReachLevel, ReachRequirement>,
}

impl ReachRequirementTable {
    /// Build a table from explicit requirements. Later entries for the same
    /// level replace earlier ones.
    pub fn from_requirements(requirements: impl IntoIterator<Item = ReachRequirement>) -> Self {
        Self {
            requirements: requirements.into_iter().map(|r| (r.level, r)).collect(),
        }
    }

    pub fn get(&self, level: ReachLevel) -> Option<&ReachRequirement> {
        self.requirements.get(&level)
    }

    /// Replace the requirement for one level.
    pub fn set(&mut self, requirement: ReachRequirement) {
        self.requirements.insert(requirement.level, requirement);
    }

    /// Evaluate `level` against `evidence`.
    pub fn evaluate(&self, level: ReachLevel, evidence: &ReachEvidence) -> Result<(), ReachShortfall> {
        if level == ReachLevel::Private {
            return Ok(());
        }
        match self.requirements.get(&level) {
            Some(requirement) => requirement.evaluate(evidence),
            None => Err(ReachShortfall::Undefined),
        }
    }
}

impl Default for ReachRequirementTable {
    fn default() -> Self {
        use AttestationType::*;

        let wide_reach_flags = BTreeSet::from([
            FlagType::Disputed,
            FlagType::UnderReview,
            FlagType::AppealPending,
            FlagType::SafetyConcern,
        ]);

        Self::from_requirements([
            ReachRequirement::open(ReachLevel::Private),
            ReachRequirement::open(ReachLevel::Invited),
            ReachRequirement {
                level: ReachLevel::Local,
                attestations: AttestationRequirement::any_of([
                    AuthorVerified,
                    StewardApproved,
                    CommunityEndorsed,
                    PeerReviewed,
                    GovernanceRatified,
                    CurriculumCanonical,
                ]),
                min_trust_score: 0.1,
                min_endorsements: 0,
                forbidden_flags: BTreeSet::from([FlagType::SafetyConcern]),
            },
            ReachRequirement {
                level: ReachLevel::Community,
                attestations: AttestationRequirement::any_of([
                    StewardApproved,
                    CommunityEndorsed,
                    PeerReviewed,
                    GovernanceRatified,
                    CurriculumCanonical,
                ]),
                min_trust_score: 0.3,
                min_endorsements: 0,
                forbidden_flags: BTreeSet::from([
                    FlagType::Disputed,
                    FlagType::UnderReview,
                    FlagType::SafetyConcern,
                ]),
            },
            ReachRequirement {
                level: ReachLevel::Federated,
                attestations: AttestationRequirement::any_of([
                    PeerReviewed,
                    GovernanceRatified,
                    CurriculumCanonical,
                ]),
                min_trust_score: 0.6,
                min_endorsements: 0,
                forbidden_flags: wide_reach_flags.clone(),
            },
            ReachRequirement {
                level: ReachLevel::Commons,
                attestations: AttestationRequirement::any_of([
                    GovernanceRatified,
                    CurriculumCanonical,
                ]),
                min_trust_score: 0.8,
                min_endorsements: 0,
                forbidden_flags: wide_reach_flags,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(types: &[AttestationType], score: f64) -> ReachEvidence {
        ReachEvidence {
            active_types: types.iter().copied().collect(),
            trust_score: score,
            endorsements: 0,
            open_flags: BTreeSet::new(),
        }
    }

    #[test]
    fn test_any_of_vs_all_of() {
        let present = BTreeSet::from([AttestationType::PeerReviewed]);
        let any = AttestationRequirement::any_of([
            AttestationType::PeerReviewed,
            AttestationType::GovernanceRatified,
        ]);
        let all = AttestationRequirement::all_of([
            AttestationType::PeerReviewed,
            AttestationType::GovernanceRatified,
        ]);
        assert!(any.is_satisfied_by(&present));
        assert!(!all.is_satisfied_by(&present));
        assert!(AttestationRequirement::default().is_satisfied_by(&BTreeSet::new()));
    }

    #[test]
    fn test_private_always_satisfied() {
        let table = ReachRequirementTable::from_requirements([]);
        assert!(table.evaluate(ReachLevel::Private, &ReachEvidence::default()).is_ok());
        assert_eq!(
            table.evaluate(ReachLevel::Invited, &ReachEvidence::default()),
            Err(ReachShortfall::Undefined)
        );
    }

    #[test]
    fn test_default_commons_accepts_governance_ratified() {
        let table = ReachRequirementTable::default();
        let ev = evidence(&[AttestationType::GovernanceRatified], 0.85);
        assert!(table.evaluate(ReachLevel::Commons, &ev).is_ok());
    }

    #[test]
    fn test_trust_score_checked() {
        let table = ReachRequirementTable::default();
        let ev = evidence(&[AttestationType::PeerReviewed], 0.4);
        assert_eq!(
            table.evaluate(ReachLevel::Federated, &ev),
            Err(ReachShortfall::TrustScoreBelow {
                required: 0.6,
                actual: 0.4
            })
        );
        assert!(table.evaluate(ReachLevel::Community, &ev).is_ok());
    }

    #[test]
    fn test_forbidden_flags_block() {
        let table = ReachRequirementTable::default();
        let mut ev = evidence(&[AttestationType::GovernanceRatified], 0.85);
        ev.open_flags.insert(FlagType::Disputed);
        assert!(matches!(
            table.evaluate(ReachLevel::Commons, &ev),
            Err(ReachShortfall::BlockedByFlags(_))
        ));
        assert!(matches!(
            table.evaluate(ReachLevel::Community, &ev),
            Err(ReachShortfall::BlockedByFlags(_))
        ));
        assert!(table.evaluate(ReachLevel::Local, &ev).is_ok());
    }

    #[test]
    fn test_threshold_tolerates_rounding() {
        let table = ReachRequirementTable::default();
        // 1.0 - 0.9 lands just under 0.1 in binary floating point.
        let ev = evidence(&[AttestationType::AuthorVerified], 1.0 - 0.9);
        assert!(table.evaluate(ReachLevel::Local, &ev).is_ok());
    }

    #[test]
    fn test_endorsement_minimum() {
        let mut table = ReachRequirementTable::default();
        let mut community = table.get(ReachLevel::Community).cloned().unwrap();
        community.min_endorsements = 5;
        table.set(community);

        let mut ev = evidence(&[AttestationType::CommunityEndorsed], 0.5);
        ev.endorsements = 3;
        assert_eq!(
            table.evaluate(ReachLevel::Community, &ev),
            Err(ReachShortfall::EndorsementsBelow {
                required: 5,
                actual: 3
            })
        );
        ev.endorsements = 5;
        assert!(table.evaluate(ReachLevel::Community, &ev).is_ok());
    }
}
