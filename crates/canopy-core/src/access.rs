// crates/canopy-core/src/access.rs
//
// Requester-side access vocabulary: authentication levels and the credential
// bundle supplied by the external credential provider.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reach::ReachLevel;

/// Authentication level of a requester, ordered `visitor < member < attested`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Anonymous or unauthenticated.
    #[default]
    Visitor,
    /// Authenticated member.
    Member,
    /// Member holding at least one verified credential.
    Attested,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visitor => "visitor",
            Self::Member => "member",
            Self::Attested => "attested",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a required set of credentials is composed.
///
/// Declared on each requirement instance rather than inferred from field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementMode {
    /// At least one member of the set must be present (an empty set is trivially satisfied).
    AnyOf,
    /// Every member of the set must be present.
    #[default]
    AllOf,
}

/// Credentials a requester presents, as supplied by the credential provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterCredentials {
    /// Requester identity, if known.
    #[serde(default)]
    pub requester_id: Option<String>,
    /// Authentication level.
    #[serde(default)]
    pub level: AccessLevel,
    /// Agent attestations (credentials) the requester holds.
    #[serde(default)]
    pub held_attestations: BTreeSet<String>,
    /// Learning paths the requester has completed.
    #[serde(default)]
    pub completed_paths: BTreeSet<String>,
    /// Whether governance approval has been granted to this requester.
    #[serde(default)]
    pub governance_approved: bool,
    /// Whether the requester's age has been verified.
    #[serde(default)]
    pub age_verified: bool,
    /// Narrowest audience circle the requester belongs to relative to the content.
    /// The author is `private`; an unrelated stranger is `commons`.
    #[serde(default = "default_audience")]
    pub audience: ReachLevel,
}

fn default_audience() -> ReachLevel {
    ReachLevel::Commons
}

impl RequesterCredentials {
    /// Anonymous visitor with no credentials; the strictest requester.
    pub fn anonymous() -> Self {
        Self {
            requester_id: None,
            level: AccessLevel::Visitor,
            held_attestations: BTreeSet::new(),
            completed_paths: BTreeSet::new(),
            governance_approved: false,
            age_verified: false,
            audience: default_audience(),
        }
    }
}

impl Default for RequesterCredentials {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_level_ordering() {
        assert!(AccessLevel::Visitor < AccessLevel::Member);
        assert!(AccessLevel::Member < AccessLevel::Attested);
    }

    #[test]
    fn test_credentials_defaults_are_strict() {
        let creds: RequesterCredentials = serde_json::from_str("{}").unwrap();
        assert_eq!(creds.level, AccessLevel::Visitor);
        assert!(creds.held_attestations.is_empty());
        assert!(!creds.governance_approved);
        assert_eq!(creds.audience, ReachLevel::Commons);
        assert_eq!(creds, RequesterCredentials::anonymous());
    }
}
