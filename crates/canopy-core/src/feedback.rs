// crates/canopy-core/src/feedback.rs
//
// Feedback profile records: which engagement mechanisms are permitted on a
// content item, and the append-only history of how that set evolved.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CanopyError;
use crate::extension::Extensions;

/// Friction tier of an engagement mechanism, ordered `low < medium < high < none`.
///
/// `none` means no engagement at all, which makes it the most restrictive tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrictionTier {
    Low,
    Medium,
    High,
    None,
}

/// An engagement mechanism that may be permitted or prohibited on content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackMechanism {
    ViewOnly,
    EmotionalReaction,
    Endorsement,
    GraduatedFeedback,
    Discussion,
    Annotation,
    ProposalVote,
    FormalChallenge,
    PeerReview,
}

impl FeedbackMechanism {
    pub const ALL: [FeedbackMechanism; 9] = [
        FeedbackMechanism::ViewOnly,
        FeedbackMechanism::EmotionalReaction,
        FeedbackMechanism::Endorsement,
        FeedbackMechanism::GraduatedFeedback,
        FeedbackMechanism::Discussion,
        FeedbackMechanism::Annotation,
        FeedbackMechanism::ProposalVote,
        FeedbackMechanism::FormalChallenge,
        FeedbackMechanism::PeerReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewOnly => "view-only",
            Self::EmotionalReaction => "emotional-reaction",
            Self::Endorsement => "endorsement",
            Self::GraduatedFeedback => "graduated-feedback",
            Self::Discussion => "discussion",
            Self::Annotation => "annotation",
            Self::ProposalVote => "proposal-vote",
            Self::FormalChallenge => "formal-challenge",
            Self::PeerReview => "peer-review",
        }
    }

    pub fn friction_tier(&self) -> FrictionTier {
        match self {
            Self::ViewOnly => FrictionTier::None,
            Self::EmotionalReaction | Self::Endorsement => FrictionTier::Low,
            Self::GraduatedFeedback | Self::Discussion | Self::Annotation => FrictionTier::Medium,
            Self::ProposalVote | Self::FormalChallenge | Self::PeerReview => FrictionTier::High,
        }
    }
}

impl FromStr for FeedbackMechanism {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedbackMechanism::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CanopyError::Validation(format!("Unknown feedback mechanism: {}", s)))
    }
}

impl fmt::Display for FeedbackMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowest friction tier present in `mechanisms`; `none` for an empty set.
pub fn min_friction(mechanisms: &BTreeSet<FeedbackMechanism>) -> FrictionTier {
    mechanisms
        .iter()
        .map(FeedbackMechanism::friction_tier)
        .min()
        .unwrap_or(FrictionTier::None)
}

/// Content-sensitivity category used to pick the initial profile template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SensitivityCategory {
    #[default]
    General,
    Educational,
    Sensitive,
    Governance,
    Personal,
}

impl SensitivityCategory {
    pub const ALL: [SensitivityCategory; 5] = [
        SensitivityCategory::General,
        SensitivityCategory::Educational,
        SensitivityCategory::Sensitive,
        SensitivityCategory::Governance,
        SensitivityCategory::Personal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Educational => "educational",
            Self::Sensitive => "sensitive",
            Self::Governance => "governance",
            Self::Personal => "personal",
        }
    }
}

impl FromStr for SensitivityCategory {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensitivityCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CanopyError::Validation(format!("Unknown sensitivity category: {}", s)))
    }
}

impl fmt::Display for SensitivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template a profile is instantiated from at content creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileTemplate {
    pub id: String,
    pub category: SensitivityCategory,
    pub permitted: BTreeSet<FeedbackMechanism>,
    #[serde(default)]
    pub prohibited: BTreeSet<FeedbackMechanism>,
    pub rationale: String,
}

/// Event that caused a profile change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeTrigger {
    /// Profile created from its template.
    Instantiated,
    AttestationGranted,
    AttestationRevoked,
    FlagRaised,
    FlagResolved,
    GovernanceDecision,
    StewardRequest,
    TemplateUpdate,
}

/// Whether a change opened or narrowed engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    /// First entry of every history.
    Initial,
    Upgrade,
    Downgrade,
}

/// One entry in a profile's append-only evolution history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChange {
    pub id: String,
    pub changed_at: DateTime<Utc>,
    pub trigger: ChangeTrigger,
    pub direction: ChangeDirection,
    pub previous_mechanisms: BTreeSet<FeedbackMechanism>,
    pub new_mechanisms: BTreeSet<FeedbackMechanism>,
    pub reason: String,
}

/// How a profile's initial state was determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetermination {
    pub category: SensitivityCategory,
    #[serde(default)]
    pub template_id: Option<String>,
    pub determined_by: String,
    pub determined_at: DateTime<Utc>,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Engagement mechanisms currently permitted on a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackProfile {
    pub id: String,
    pub content_id: String,
    pub permitted_mechanisms: BTreeSet<FeedbackMechanism>,
    #[serde(default)]
    pub prohibited_mechanisms: BTreeSet<FeedbackMechanism>,
    #[serde(default)]
    pub determination: Option<ProfileDetermination>,
    #[serde(default)]
    pub history: Vec<ProfileChange>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl FeedbackProfile {
    /// The strictest profile: view-only, nothing prohibited beyond that, no history.
    ///
    /// Returned for content with no recorded profile; absence of a profile is
    /// never read as permission.
    pub fn strict_default(content_id: &str) -> Self {
        Self {
            id: format!("default:{}", content_id),
            content_id: content_id.to_string(),
            permitted_mechanisms: BTreeSet::from([FeedbackMechanism::ViewOnly]),
            prohibited_mechanisms: BTreeSet::new(),
            determination: None,
            history: Vec::new(),
            extensions: Extensions::new(),
        }
    }

    /// The latest history entry, if any.
    pub fn latest_change(&self) -> Option<&ProfileChange> {
        self.history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friction_ordering() {
        assert!(FrictionTier::Low < FrictionTier::Medium);
        assert!(FrictionTier::Medium < FrictionTier::High);
        assert!(FrictionTier::High < FrictionTier::None);
    }

    #[test]
    fn test_min_friction() {
        let empty = BTreeSet::new();
        assert_eq!(min_friction(&empty), FrictionTier::None);

        let view = BTreeSet::from([FeedbackMechanism::ViewOnly]);
        assert_eq!(min_friction(&view), FrictionTier::None);

        let mixed = BTreeSet::from([
            FeedbackMechanism::ViewOnly,
            FeedbackMechanism::Discussion,
            FeedbackMechanism::ProposalVote,
        ]);
        assert_eq!(min_friction(&mixed), FrictionTier::Medium);
    }

    #[test]
    fn test_strict_default_is_view_only() {
        let profile = FeedbackProfile::strict_default("c1");
        assert_eq!(
            profile.permitted_mechanisms,
            BTreeSet::from([FeedbackMechanism::ViewOnly])
        );
        assert!(profile.history.is_empty());
    }

    #[test]
    fn test_mechanism_parse_round_trip() {
        for m in FeedbackMechanism::ALL {
            assert_eq!(m.as_str().parse::<FeedbackMechanism>().unwrap(), m);
            let json = serde_json::to_string(&m).unwrap();
            assert_eq!(json, format!("\"{}\"", m.as_str()));
        }
    }
}
