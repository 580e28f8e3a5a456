// crates/canopy-core/src/attestation.rs
//
// Content attestations: revocable, expirable credential records that grant a
// content item a reach ceiling.
//
// Records are immutable once written. The attestation store keeps an
// append-only event log; a record's status is re-stated by later events
// (revocation, supersession) or derived at read time (expiry), never edited.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CanopyError;
use crate::extension::Extensions;
use crate::flag::FlagType;
use crate::reach::ReachLevel;

/// Kind of trust claim an attestation makes about content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttestationType {
    /// Author identity confirmed.
    AuthorVerified,
    /// Domain steward reviewed and approved.
    StewardApproved,
    /// Received endorsements from the community.
    CommunityEndorsed,
    /// Formal review by qualified peers.
    PeerReviewed,
    /// Approved through a governance process.
    GovernanceRatified,
    /// Official learning content for a path.
    CurriculumCanonical,
    /// Checked for harmful content.
    SafetyReviewed,
    /// Factual accuracy validated.
    AccuracyVerified,
    /// Meets accessibility standards.
    AccessibilityChecked,
    /// IP and licensing verified.
    LicenseCleared,
}

impl AttestationType {
    pub const ALL: [AttestationType; 10] = [
        AttestationType::AuthorVerified,
        AttestationType::StewardApproved,
        AttestationType::CommunityEndorsed,
        AttestationType::PeerReviewed,
        AttestationType::GovernanceRatified,
        AttestationType::CurriculumCanonical,
        AttestationType::SafetyReviewed,
        AttestationType::AccuracyVerified,
        AttestationType::AccessibilityChecked,
        AttestationType::LicenseCleared,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorVerified => "author-verified",
            Self::StewardApproved => "steward-approved",
            Self::CommunityEndorsed => "community-endorsed",
            Self::PeerReviewed => "peer-reviewed",
            Self::GovernanceRatified => "governance-ratified",
            Self::CurriculumCanonical => "curriculum-canonical",
            Self::SafetyReviewed => "safety-reviewed",
            Self::AccuracyVerified => "accuracy-verified",
            Self::AccessibilityChecked => "accessibility-checked",
            Self::LicenseCleared => "license-cleared",
        }
    }
}

impl FromStr for AttestationType {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttestationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CanopyError::Validation(format!("Unknown attestation type: {}", s)))
    }
}

impl fmt::Display for AttestationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an attestation.
///
///   Active --> Expired
///     |   \
///     |    --> Revoked
///     v
///   Superseded
///
/// Transitions are one-directional; every non-active status is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttestationStatus {
    #[default]
    Active,
    Expired,
    Revoked,
    Superseded,
}

impl AttestationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Superseded => "superseded",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: AttestationStatus) -> bool {
        matches!(
            (self, next),
            (
                AttestationStatus::Active,
                AttestationStatus::Expired | AttestationStatus::Revoked | AttestationStatus::Superseded
            )
        )
    }
}

impl fmt::Display for AttestationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of the party granting an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrantorType {
    Author,
    Steward,
    Peer,
    Community,
    Governance,
    System,
}

/// Who granted an attestation. Signature verification happens upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationGrantor {
    pub grantor_id: String,
    pub grantor_type: GrantorType,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Revocation re-statement attached to a revoked attestation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationRevocation {
    pub revoked_by: String,
    pub revoked_at: DateTime<Utc>,
    pub reason: String,
}

/// Evidence backing an attestation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationEvidence {
    /// Number of community endorsements backing the claim.
    #[serde(default)]
    pub endorsement_count: u32,
    /// Review records referenced by the claim.
    #[serde(default)]
    pub review_ids: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Concerns raised by the reviewer while granting. These stay attached to
    /// the content until an explicit flag record resolves them.
    #[serde(default)]
    pub raised_flags: Vec<FlagType>,
}

/// Optional restriction of where an attestation applies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationScope {
    /// Content ids the attestation covers. Empty means unrestricted.
    #[serde(default)]
    pub content_ids: Vec<String>,
    /// Communities or regions the claim was made within.
    #[serde(default)]
    pub communities: Vec<String>,
}

/// A content attestation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub id: String,
    pub content_id: String,
    #[serde(rename = "type")]
    pub attestation_type: AttestationType,
    pub reach_granted: ReachLevel,
    pub granted_by: AttestationGrantor,
    pub granted_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: AttestationStatus,
    #[serde(default)]
    pub revocation: Option<AttestationRevocation>,
    #[serde(default)]
    pub superseded_by: Option<String>,
    #[serde(default)]
    pub superseded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub evidence: Option<AttestationEvidence>,
    #[serde(default)]
    pub scope: Option<AttestationScope>,
    #[serde(default, skip_serializing_if = "Extensions::is_empty")]
    pub extensions: Extensions,
}

impl Attestation {
    /// Status as of `now`.
    ///
    /// A stored `active` record past its expiry reads as `expired`. A record
    /// revoked or superseded after `now` still reads as it stood at `now`;
    /// without a recorded end time the terminal status always applies.
    pub fn effective_status(&self, now: DateTime<Utc>) -> AttestationStatus {
        let status = if self.ended_after(now) {
            AttestationStatus::Active
        } else {
            self.status
        };
        match (status, self.expires_at) {
            (AttestationStatus::Active, Some(expires)) if expires <= now => AttestationStatus::Expired,
            (status, _) => status,
        }
    }

    fn ended_after(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            AttestationStatus::Revoked => self.revocation.as_ref().is_some_and(|r| r.revoked_at > now),
            AttestationStatus::Superseded => self.superseded_at.is_some_and(|at| at > now),
            _ => false,
        }
    }

    /// Whether the record's scope covers `content_id`.
    pub fn applies_to(&self, content_id: &str) -> bool {
        if self.content_id != content_id {
            return false;
        }
        match &self.scope {
            Some(scope) if !scope.content_ids.is_empty() => {
                scope.content_ids.iter().any(|c| c == content_id)
            }
            _ => true,
        }
    }

    /// Endorsements carried by the evidence, 0 when absent.
    pub fn endorsement_count(&self) -> u32 {
        self.evidence.as_ref().map_or(0, |e| e.endorsement_count)
    }

    /// A copy with `status` re-stated as of `now`. The stored record is untouched.
    /// Revocation and supersession details that lie after `now` are dropped
    /// from the copy.
    pub fn restated_at(&self, now: DateTime<Utc>) -> Attestation {
        let mut copy = self.clone();
        if self.ended_after(now) {
            copy.revocation = None;
            copy.superseded_by = None;
            copy.superseded_at = None;
        }
        copy.status = self.effective_status(now);
        copy
    }
}

/// An entry in the append-only attestation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AttestationEvent {
    /// A new attestation was granted.
    Granted { attestation: Attestation },
    /// An active attestation was revoked.
    #[serde(rename_all = "camelCase")]
    Revoked {
        attestation_id: String,
        revocation: AttestationRevocation,
    },
    /// An active attestation was replaced by a newer one.
    #[serde(rename_all = "camelCase")]
    Superseded {
        attestation_id: String,
        superseded_by: String,
        at: DateTime<Utc>,
    },
}

impl AttestationEvent {
    /// The attestation id the event concerns.
    pub fn attestation_id(&self) -> &str {
        match self {
            Self::Granted { attestation } => &attestation.id,
            Self::Revoked { attestation_id, .. } => attestation_id,
            Self::Superseded { attestation_id, .. } => attestation_id,
        }
    }
}

/// Fold one event into the derived record set.
///
/// Rejects duplicate grants, unknown ids, and any transition out of a
/// non-active status. On error `records` is left unchanged.
pub fn apply_event(records: &mut Vec<Attestation>, event: &AttestationEvent) -> Result<(), CanopyError> {
    match event {
        AttestationEvent::Granted { attestation } => {
            if attestation.id.is_empty() || attestation.content_id.is_empty() {
                return Err(CanopyError::Validation(
                    "Attestation id and content id must be non-empty".to_string(),
                ));
            }
            if records.iter().any(|r| r.id == attestation.id) {
                return Err(CanopyError::Validation(format!(
                    "Attestation {} already exists",
                    attestation.id
                )));
            }
            if attestation.status != AttestationStatus::Active {
                return Err(CanopyError::Validation(format!(
                    "Attestation {} must be granted in active status, got {}",
                    attestation.id, attestation.status
                )));
            }
            records.push(attestation.clone());
            Ok(())
        }
        AttestationEvent::Revoked {
            attestation_id,
            revocation,
        } => {
            let record = find_transitionable(records, attestation_id, AttestationStatus::Revoked)?;
            record.status = AttestationStatus::Revoked;
            record.revocation = Some(revocation.clone());
            Ok(())
        }
        AttestationEvent::Superseded {
            attestation_id,
            superseded_by,
            at,
        } => {
            if attestation_id == superseded_by {
                return Err(CanopyError::Validation(format!(
                    "Attestation {} cannot supersede itself",
                    attestation_id
                )));
            }
            let record =
                find_transitionable(records, attestation_id, AttestationStatus::Superseded)?;
            record.status = AttestationStatus::Superseded;
            record.superseded_by = Some(superseded_by.clone());
            record.superseded_at = Some(*at);
            Ok(())
        }
    }
}

fn find_transitionable<'a>(
    records: &'a mut [Attestation],
    attestation_id: &str,
    next: AttestationStatus,
) -> Result<&'a mut Attestation, CanopyError> {
    let record = records
        .iter_mut()
        .find(|r| r.id == attestation_id)
        .ok_or_else(|| CanopyError::NotFound(format!("attestation {}", attestation_id)))?;
    if !record.status.can_transition_to(next) {
        return Err(CanopyError::Validation(format!(
            "Illegal attestation transition for {}: {} -> {}",
            attestation_id, record.status, next
        )));
    }
    Ok(record)
}
