// crates/canopy-reach/src/resolver.rs
//
// Reach resolution: attestations + flags -> ContentTrustProfile.
//
// Steps, all evaluated as of the caller-supplied instant:
//   1. Re-state each attestation's status (expiry) without touching the record.
//   2. Split into the active set and the historical set.
//   3. Take the widest reach any active attestation grants as the candidate.
//   4. Score trust and collect open flags.
//   5. Walk down from the candidate until a level's requirement predicate
//      holds. Wide-reach blocking flags always rule out federated/commons.
//      `private` always holds, so the walk terminates.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use canopy_core::{Attestation, AttestationStatus, ContentFlag, FlagType, ReachLevel};

use crate::flags::{collect_flags, TrustFlag};
use crate::requirements::{ReachEvidence, ReachRequirementTable, ReachShortfall};
use crate::trust_score::{TrustScorePolicy, WeightedTrustPolicy};

/// Derived trust view of a content item. Never stored as authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTrustProfile {
    pub content_id: String,
    pub effective_reach: ReachLevel,
    /// Widest reach any single active attestation grants.
    pub candidate_reach: ReachLevel,
    /// Active, unexpired, unrevoked attestations in scope for this content.
    pub active_attestations: Vec<Attestation>,
    /// Everything else, with status re-stated as of `computed_at`.
    pub historical_attestations: Vec<Attestation>,
    pub trust_score: f64,
    pub endorsement_count: u32,
    pub flags: Vec<TrustFlag>,
    pub computed_at: DateTime<Utc>,
}

impl ContentTrustProfile {
    /// Distinct open flag types.
    pub fn open_flag_types(&self) -> BTreeSet<FlagType> {
        self.flags.iter().map(|f| f.flag_type).collect()
    }

    pub fn has_attestations(&self) -> bool {
        !self.active_attestations.is_empty() || !self.historical_attestations.is_empty()
    }
}

/// Resolves trust profiles using a requirement table and a trust score policy.
#[derive(Debug)]
pub struct ReachResolver {
    requirements: ReachRequirementTable,
    policy: Box<dyn TrustScorePolicy>,
}

impl ReachResolver {
    pub fn new(requirements: ReachRequirementTable, policy: Box<dyn TrustScorePolicy>) -> Self {
        Self {
            requirements,
            policy,
        }
    }

    pub fn requirements(&self) -> &ReachRequirementTable {
        &self.requirements
    }

    /// Resolve the trust profile of `content_id` as of `now`.
    ///
    /// Records belonging to other content ids are ignored. An empty input
    /// resolves to `private` with trust score 0.
    pub fn resolve_trust_profile(
        &self,
        content_id: &str,
        attestations: &[Attestation],
        flags: &[ContentFlag],
        now: DateTime<Utc>,
    ) -> ContentTrustProfile {
        let own: Vec<&Attestation> = attestations
            .iter()
            .filter(|a| a.content_id == content_id)
            .collect();

        let mut active_attestations = Vec::new();
        let mut historical_attestations = Vec::new();
        for attestation in own.iter().copied() {
            let restated = attestation.restated_at(now);
            if restated.status == AttestationStatus::Active
                && restated.granted_at <= now
                && restated.applies_to(content_id)
            {
                active_attestations.push(restated);
            } else {
                historical_attestations.push(restated);
            }
        }

        let candidate_reach = active_attestations
            .iter()
            .map(|a| a.reach_granted)
            .max()
            .unwrap_or(ReachLevel::Private);

        let endorsement_count = active_attestations
            .iter()
            .map(Attestation::endorsement_count)
            .fold(0u32, u32::saturating_add);
        let active_refs: Vec<&Attestation> = active_attestations.iter().collect();
        let trust_score = self.policy.score(&active_refs, endorsement_count);

        let own_records: Vec<Attestation> = own.into_iter().cloned().collect();
        let trust_flags = collect_flags(content_id, &own_records, flags, now);

        let evidence = ReachEvidence {
            active_types: active_attestations
                .iter()
                .map(|a| a.attestation_type)
                .collect(),
            trust_score,
            endorsements: endorsement_count,
            open_flags: trust_flags.iter().map(|f| f.flag_type).collect(),
        };

        let effective_reach = self.settle_reach(content_id, candidate_reach, &evidence);

        tracing::debug!(
            content_id,
            candidate = %candidate_reach,
            effective = %effective_reach,
            trust_score,
            active = active_attestations.len(),
            flags = trust_flags.len(),
            "Resolved trust profile"
        );

        ContentTrustProfile {
            content_id: content_id.to_string(),
            effective_reach,
            candidate_reach,
            active_attestations,
            historical_attestations,
            trust_score,
            endorsement_count,
            flags: trust_flags,
            computed_at: now,
        }
    }

    /// Step down from `candidate` to the highest level whose predicate holds.
    fn settle_reach(
        &self,
        content_id: &str,
        candidate: ReachLevel,
        evidence: &ReachEvidence,
    ) -> ReachLevel {
        let wide_blocked = evidence.open_flags.iter().any(FlagType::blocks_wide_reach);
        let mut level = candidate;
        loop {
            let outcome = if wide_blocked && level.is_wide() {
                Err(ReachShortfall::BlockedByFlags(
                    evidence
                        .open_flags
                        .iter()
                        .copied()
                        .filter(FlagType::blocks_wide_reach)
                        .collect(),
                ))
            } else {
                self.requirements.evaluate(level, evidence)
            };

            match (outcome, level.next_lower()) {
                (Ok(()), _) | (Err(_), None) => return level,
                (Err(shortfall), Some(lower)) => {
                    tracing::trace!(content_id, level = %level, ?shortfall, "Reach requirement unmet");
                    level = lower;
                }
            }
        }
    }
}

impl Default for ReachResolver {
    fn default() -> Self {
        Self::new(
            ReachRequirementTable::default(),
            Box::new(WeightedTrustPolicy::default()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{
        AttestationEvidence, AttestationGrantor, AttestationRevocation, AttestationType,
        Extensions, GrantorType,
    };
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    fn make(id: &str, kind: AttestationType, reach: ReachLevel) -> Attestation {
        Attestation {
            id: id.into(),
            content_id: "content-1".into(),
            attestation_type: kind,
            reach_granted: reach,
            granted_by: AttestationGrantor {
                grantor_id: "grantor".into(),
                grantor_type: GrantorType::Governance,
                display_name: None,
            },
            granted_at: now() - Duration::days(10),
            expires_at: None,
            status: AttestationStatus::Active,
            revocation: None,
            superseded_by: None,
            superseded_at: None,
            evidence: None,
            scope: None,
            extensions: Extensions::new(),
        }
    }

    fn flag(kind: FlagType) -> ContentFlag {
        ContentFlag {
            id: format!("flag-{}", kind),
            content_id: "content-1".into(),
            flag_type: kind,
            raised_by: "member".into(),
            raised_at: now() - Duration::days(1),
            reason: None,
            resolved_at: None,
        }
    }

    #[test]
    fn test_zero_attestations_resolve_private() {
        let resolver = ReachResolver::default();
        let profile = resolver.resolve_trust_profile("content-1", &[], &[], now());
        assert_eq!(profile.effective_reach, ReachLevel::Private);
        assert_eq!(profile.trust_score, 0.0);
        assert!(!profile.has_attestations());
    }

    #[test]
    fn test_governance_ratified_reaches_commons() {
        let resolver = ReachResolver::default();
        let atts = vec![make("a1", AttestationType::GovernanceRatified, ReachLevel::Commons)];
        let profile = resolver.resolve_trust_profile("content-1", &atts, &[], now());
        assert_eq!(profile.effective_reach, ReachLevel::Commons);
        assert!(profile.trust_score >= 0.8);
    }

    #[test]
    fn test_disputed_flag_caps_at_local() {
        let resolver = ReachResolver::default();
        let atts = vec![make("a1", AttestationType::GovernanceRatified, ReachLevel::Commons)];
        let flags = vec![flag(FlagType::Disputed)];
        let profile = resolver.resolve_trust_profile("content-1", &atts, &flags, now());
        assert_eq!(profile.effective_reach, ReachLevel::Local);
        assert_eq!(profile.candidate_reach, ReachLevel::Commons);
        assert!(profile.open_flag_types().contains(&FlagType::Disputed));
    }

    #[test]
    fn test_appeal_pending_blocks_wide_reach_only() {
        let resolver = ReachResolver::default();
        let atts = vec![make("a1", AttestationType::GovernanceRatified, ReachLevel::Commons)];
        let flags = vec![flag(FlagType::AppealPending)];
        let profile = resolver.resolve_trust_profile("content-1", &atts, &flags, now());
        assert_eq!(profile.effective_reach, ReachLevel::Community);
    }

    #[test]
    fn test_wide_block_holds_even_with_permissive_table() {
        let permissive = ReachRequirementTable::from_requirements(
            ReachLevel::ALL.map(crate::requirements::ReachRequirement::open),
        );
        let resolver = ReachResolver::new(permissive, Box::new(WeightedTrustPolicy::default()));
        let atts = vec![make("a1", AttestationType::AuthorVerified, ReachLevel::Commons)];
        let profile =
            resolver.resolve_trust_profile("content-1", &atts, &[flag(FlagType::UnderReview)], now());
        assert_eq!(profile.effective_reach, ReachLevel::Community);
    }

    #[test]
    fn test_expired_attestation_moves_to_history() {
        let resolver = ReachResolver::default();
        let mut att = make("a1", AttestationType::GovernanceRatified, ReachLevel::Commons);
        att.expires_at = Some(now() - Duration::days(1));
        let profile = resolver.resolve_trust_profile("content-1", &[att.clone()], &[], now());
        assert_eq!(profile.effective_reach, ReachLevel::Private);
        assert_eq!(profile.historical_attestations.len(), 1);
        assert_eq!(
            profile.historical_attestations[0].status,
            AttestationStatus::Expired
        );
        // Stored record untouched.
        assert_eq!(att.status, AttestationStatus::Active);
    }

    #[test]
    fn test_superseded_kept_for_audit() {
        let resolver = ReachResolver::default();
        let mut old = make("a1", AttestationType::PeerReviewed, ReachLevel::Federated);
        old.status = AttestationStatus::Superseded;
        old.superseded_by = Some("a2".into());
        let new = make("a2", AttestationType::StewardApproved, ReachLevel::Community);
        let profile = resolver.resolve_trust_profile("content-1", &[old, new], &[], now());
        assert_eq!(profile.active_attestations.len(), 1);
        assert_eq!(profile.historical_attestations.len(), 1);
        assert_eq!(profile.effective_reach, ReachLevel::Community);
    }

    #[test]
    fn test_steps_down_when_trust_insufficient() {
        let resolver = ReachResolver::default();
        // Author verification claims commons but only justifies local.
        let atts = vec![make("a1", AttestationType::AuthorVerified, ReachLevel::Commons)];
        let profile = resolver.resolve_trust_profile("content-1", &atts, &[], now());
        assert_eq!(profile.effective_reach, ReachLevel::Local);
    }

    #[test]
    fn test_revocation_drops_reach() {
        let resolver = ReachResolver::default();
        let mut att = make("a1", AttestationType::GovernanceRatified, ReachLevel::Commons);
        let before = resolver.resolve_trust_profile("content-1", &[att.clone()], &[], now());
        att.status = AttestationStatus::Revoked;
        att.revocation = Some(AttestationRevocation {
            revoked_by: "gov".into(),
            revoked_at: now(),
            reason: "overturned".into(),
        });
        let after = resolver.resolve_trust_profile("content-1", &[att], &[], now());
        assert!(after.effective_reach < before.effective_reach);
        assert_eq!(after.effective_reach, ReachLevel::Private);
    }

    #[test]
    fn test_endorsements_counted_from_evidence() {
        let resolver = ReachResolver::default();
        let mut att = make("a1", AttestationType::CommunityEndorsed, ReachLevel::Community);
        att.evidence = Some(AttestationEvidence {
            endorsement_count: 12,
            ..Default::default()
        });
        let profile = resolver.resolve_trust_profile("content-1", &[att], &[], now());
        assert_eq!(profile.endorsement_count, 12);
        assert!(profile.trust_score > 0.2);
        assert_eq!(profile.effective_reach, ReachLevel::Community);
    }

    #[test]
    fn test_other_content_ignored() {
        let resolver = ReachResolver::default();
        let mut att = make("a1", AttestationType::GovernanceRatified, ReachLevel::Commons);
        att.content_id = "content-2".into();
        let profile = resolver.resolve_trust_profile("content-1", &[att], &[], now());
        assert_eq!(profile.effective_reach, ReachLevel::Private);
        assert!(!profile.has_attestations());
    }

    #[test]
    fn test_idempotent() {
        let resolver = ReachResolver::default();
        let atts = vec![
            make("a1", AttestationType::PeerReviewed, ReachLevel::Federated),
            make("a2", AttestationType::StewardApproved, ReachLevel::Community),
        ];
        let flags = vec![flag(FlagType::Outdated)];
        let first = resolver.resolve_trust_profile("content-1", &atts, &flags, now());
        let second = resolver.resolve_trust_profile("content-1", &atts, &flags, now());
        assert_eq!(first, second);
    }
}
