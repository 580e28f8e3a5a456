// crates/canopy-core/src/flag.rs
//
// Flags: open concerns attached to content that cap its reach independently
// of attestation strength.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CanopyError;

/// Kind of concern a flag raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagType {
    /// Content is under an open dispute.
    Disputed,
    /// A review is in progress.
    UnderReview,
    /// A governance decision is under appeal.
    AppealPending,
    /// Possible harm to readers.
    SafetyConcern,
    /// Factual accuracy is questioned.
    AccuracyConcern,
    /// Content may be out of date.
    Outdated,
}

impl FlagType {
    pub const ALL: [FlagType; 6] = [
        FlagType::Disputed,
        FlagType::UnderReview,
        FlagType::AppealPending,
        FlagType::SafetyConcern,
        FlagType::AccuracyConcern,
        FlagType::Outdated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disputed => "disputed",
            Self::UnderReview => "under-review",
            Self::AppealPending => "appeal-pending",
            Self::SafetyConcern => "safety-concern",
            Self::AccuracyConcern => "accuracy-concern",
            Self::Outdated => "outdated",
        }
    }

    /// Flags that hard-block `federated` and `commons` no matter how strong
    /// the attestations are.
    pub fn blocks_wide_reach(&self) -> bool {
        matches!(self, Self::Disputed | Self::UnderReview | Self::AppealPending)
    }
}

impl FromStr for FlagType {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlagType::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| CanopyError::Validation(format!("Unknown flag type: {}", s)))
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An explicit flag record. Append-only: resolution is recorded by setting
/// `resolved_at` on a later re-statement, never by deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFlag {
    pub id: String,
    pub content_id: String,
    pub flag_type: FlagType,
    pub raised_by: String,
    pub raised_at: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ContentFlag {
    /// Whether the flag is still open at `now`.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        match self.resolved_at {
            Some(resolved) => resolved > now,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wide_reach_blockers() {
        assert!(FlagType::Disputed.blocks_wide_reach());
        assert!(FlagType::UnderReview.blocks_wide_reach());
        assert!(FlagType::AppealPending.blocks_wide_reach());
        assert!(!FlagType::Outdated.blocks_wide_reach());
        assert!(!FlagType::SafetyConcern.blocks_wide_reach());
    }

    #[test]
    fn test_parse_round_trip() {
        for flag in FlagType::ALL {
            assert_eq!(flag.as_str().parse::<FlagType>().unwrap(), flag);
        }
        assert!("spam".parse::<FlagType>().is_err());
    }

    #[test]
    fn test_open_until_resolved() {
        let raised = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let resolved = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let flag = ContentFlag {
            id: "f1".into(),
            content_id: "c1".into(),
            flag_type: FlagType::Disputed,
            raised_by: "agent-1".into(),
            raised_at: raised,
            reason: None,
            resolved_at: Some(resolved),
        };
        assert!(flag.is_open_at(Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap()));
        assert!(!flag.is_open_at(resolved));
    }
}
