// crates/canopy-access/src/evaluator.rs
//
// Ordered access checks. The order is fixed:
//   1. authentication level
//   2. governance approval
//   3. age verification
//   4. held attestations
//   5. completed paths
//   6. audience vs. effective reach (reach-aware variant only)
// The first failing check alone determines the denial reason and action.

use serde::{Deserialize, Serialize};

use canopy_core::{AccessLevel, ReachLevel, RequesterCredentials};
use canopy_reach::ContentTrustProfile;

use crate::requirement::AccessRequirement;

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenialReason {
    NotAuthenticated,
    GovernancePending,
    AgeVerification,
    MissingAttestation,
    MissingPath,
    ReachRestricted,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not-authenticated",
            Self::GovernancePending => "governance-pending",
            Self::AgeVerification => "age-verification",
            Self::MissingAttestation => "missing-attestation",
            Self::MissingPath => "missing-path",
            Self::ReachRestricted => "reach-restricted",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the requester can do to clear a denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum RequiredAction {
    #[serde(rename_all = "camelCase")]
    Authenticate { min_level: AccessLevel },
    AwaitGovernanceApproval,
    VerifyAge,
    ObtainAttestations { ids: Vec<String> },
    #[serde(rename_all = "camelCase")]
    CompletePath { path_id: String },
    /// Content is not yet discoverable by the requester's audience circle.
    WidenAudience { required: ReachLevel },
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResult {
    pub can_access: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial_reason: Option<DenialReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_attestations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_paths: Vec<String>,
}

impl AccessCheckResult {
    pub fn granted() -> Self {
        Self {
            can_access: true,
            denial_reason: None,
            required_action: None,
            missing_attestations: Vec::new(),
            missing_paths: Vec::new(),
        }
    }

    fn denied(reason: DenialReason, action: RequiredAction) -> Self {
        Self {
            can_access: false,
            denial_reason: Some(reason),
            required_action: Some(action),
            missing_attestations: Vec::new(),
            missing_paths: Vec::new(),
        }
    }
}

/// Evaluate `requester` against `requirement` (checks 1 through 5).
pub fn check_access(requester: &RequesterCredentials, requirement: &AccessRequirement) -> AccessCheckResult {
    let result = evaluate(requester, requirement);
    log_decision(requester, &result);
    result
}

/// Evaluate `requester` against `requirement`, then against the content's
/// effective reach.
///
/// The requester's `audience` is the narrowest circle they belong to for this
/// content. Content resolved to `community` is visible to `private` through
/// `community` audiences but not to `federated` or `commons` ones.
pub fn check_access_with_reach(
    requester: &RequesterCredentials,
    requirement: &AccessRequirement,
    profile: &ContentTrustProfile,
) -> AccessCheckResult {
    let mut result = evaluate(requester, requirement);
    if result.can_access && requester.audience > profile.effective_reach {
        result = AccessCheckResult::denied(
            DenialReason::ReachRestricted,
            RequiredAction::WidenAudience {
                required: requester.audience,
            },
        );
    }
    log_decision(requester, &result);
    result
}

fn evaluate(requester: &RequesterCredentials, requirement: &AccessRequirement) -> AccessCheckResult {
    if requester.level < requirement.min_level {
        return AccessCheckResult::denied(
            DenialReason::NotAuthenticated,
            RequiredAction::Authenticate {
                min_level: requirement.min_level,
            },
        );
    }

    if requirement.requires_governance_approval && !requester.governance_approved {
        return AccessCheckResult::denied(
            DenialReason::GovernancePending,
            RequiredAction::AwaitGovernanceApproval,
        );
    }

    if requirement.requires_age_verification && !requester.age_verified {
        return AccessCheckResult::denied(DenialReason::AgeVerification, RequiredAction::VerifyAge);
    }

    let missing_attestations = requirement
        .required_attestations
        .missing_from(&requester.held_attestations);
    if !missing_attestations.is_empty() {
        let mut result = AccessCheckResult::denied(
            DenialReason::MissingAttestation,
            RequiredAction::ObtainAttestations {
                ids: missing_attestations.clone(),
            },
        );
        result.missing_attestations = missing_attestations;
        return result;
    }

    let missing_paths: Vec<String> = requirement
        .required_paths
        .iter()
        .filter(|path| !requester.completed_paths.contains(*path))
        .cloned()
        .collect();
    if let Some(first) = missing_paths.first() {
        let mut result = AccessCheckResult::denied(
            DenialReason::MissingPath,
            RequiredAction::CompletePath {
                path_id: first.clone(),
            },
        );
        result.missing_paths = missing_paths;
        return result;
    }

    AccessCheckResult::granted()
}

fn log_decision(requester: &RequesterCredentials, result: &AccessCheckResult) {
    tracing::debug!(
        requester = requester.requester_id.as_deref().unwrap_or("anonymous"),
        can_access = result.can_access,
        reason = ?result.denial_reason,
        "Access evaluated"
    );
}
