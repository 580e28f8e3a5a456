// crates/canopy-core/src/stewardship.rs
//
// Stewardship allocation records: fractional claims by stewards to the
// recognition a content item earns.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extension::Extensions;

/// Default tolerance for the sum-to-one check on live ratios.
pub const RATIO_TOLERANCE: f64 = 1e-6;

/// Dispute lifecycle of an allocation.
///
///   Active --> Disputed --> PendingReview
///     ^           |              |
///     |           +------+-------+
///     |                  |
///     +---- restore -----+----- supersede --> Superseded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceState {
    Active,
    Disputed,
    PendingReview,
    Superseded,
}

impl GovernanceState {
    pub const ALL: [GovernanceState; 4] = [
        GovernanceState::Active,
        GovernanceState::Disputed,
        GovernanceState::PendingReview,
        GovernanceState::Superseded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disputed => "disputed",
            Self::PendingReview => "pending_review",
            Self::Superseded => "superseded",
        }
    }

    /// Whether an allocation in this state is awaiting a ratifier decision.
    pub fn is_contested(&self) -> bool {
        matches!(self, Self::Disputed | Self::PendingReview)
    }
}

impl fmt::Display for GovernanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an allocation ratio was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMethod {
    #[default]
    Manual,
    Computed,
    Negotiated,
}

/// Nature of the steward's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    OriginalCreator,
    Editor,
    Translator,
    Curator,
    Maintainer,
    #[default]
    Inherited,
}

/// Details of an open or historical dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeRecord {
    pub dispute_id: String,
    pub disputed_by: String,
    pub reason: String,
    pub disputed_at: DateTime<Utc>,
}

/// Ratifier decision closing a dispute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratification {
    pub ratifier_id: String,
    pub ratified_at: DateTime<Utc>,
}

/// A steward's share of the credit for a content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StewardshipAllocation {
    pub id: String,
    pub content_id: String,
    pub steward_id: String,
    /// Share of recognition in [0, 1].
    pub ratio: f64,
    #[serde(default)]
    pub method: AllocationMethod,
    #[serde(default)]
    pub contribution_type: ContributionType,
    #[serde(default)]
    pub contribution_evidence: Option<String>,
    pub governance_state: GovernanceState,
    #[serde(default)]
    pub dispute: Option<DisputeRecord>,
    #[serde(default)]
    pub ratification: Option<Ratification>,
    pub effective_from: DateTime<Utc>,
    #[serde(default)]
    pub effective_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(default)]
    pub recognition_accumulated: f64,
    #[serde(default)]
    pub last_recognition_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl StewardshipAllocation {
    /// Whether the allocation counts toward the content's sum-to-one total.
    ///
    /// Disputed and pending-review allocations stay live with their ratio
    /// frozen; only superseded or ended allocations drop out.
    pub fn is_live(&self) -> bool {
        self.governance_state != GovernanceState::Superseded && self.effective_until.is_none()
    }

    /// Whether the allocation currently accrues recognition.
    pub fn accrues_recognition(&self) -> bool {
        self.is_live() && self.governance_state == GovernanceState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_allocation(state: GovernanceState) -> StewardshipAllocation {
        StewardshipAllocation {
            id: "alloc-1".into(),
            content_id: "content-1".into(),
            steward_id: "steward-1".into(),
            ratio: 0.5,
            method: AllocationMethod::Manual,
            contribution_type: ContributionType::Editor,
            contribution_evidence: None,
            governance_state: state,
            dispute: None,
            ratification: None,
            effective_from: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            effective_until: None,
            superseded_by: None,
            recognition_accumulated: 0.0,
            last_recognition_at: None,
            note: None,
            extensions: Extensions::new(),
        }
    }

    #[test]
    fn test_disputed_stays_live_but_stops_accruing() {
        let alloc = make_allocation(GovernanceState::Disputed);
        assert!(alloc.is_live());
        assert!(!alloc.accrues_recognition());
    }

    #[test]
    fn test_superseded_is_not_live() {
        let alloc = make_allocation(GovernanceState::Superseded);
        assert!(!alloc.is_live());
    }

    #[test]
    fn test_governance_state_wire_strings() {
        let json = serde_json::to_string(&GovernanceState::PendingReview).unwrap();
        assert_eq!(json, "\"pending_review\"");
        for state in GovernanceState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }
}
