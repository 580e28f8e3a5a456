// crates/canopy-reach/src/flags.rs
//
// Flag collection: gathers the open concerns that cap a content item's reach.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use canopy_core::{Attestation, ContentFlag, FlagType};

/// Where an open flag came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FlagSource {
    /// An explicit flag record.
    #[serde(rename_all = "camelCase")]
    Explicit { flag_id: String },
    /// Raised in an attestation's evidence.
    #[serde(rename_all = "camelCase")]
    Attestation { attestation_id: String },
}

/// An open flag as it appears on a trust profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustFlag {
    pub flag_type: FlagType,
    pub source: FlagSource,
    pub raised_at: DateTime<Utc>,
}

/// Collect every flag open on `content_id` at `now`.
///
/// Evidence flags are read from every attestation, active or historical: a
/// concern raised while granting stays open after the attestation lapses and
/// only closes through an explicit flag record resolving that flag type.
/// Output is sorted by raise time, then flag type.
pub fn collect_flags(
    content_id: &str,
    attestations: &[Attestation],
    explicit: &[ContentFlag],
    now: DateTime<Utc>,
) -> Vec<TrustFlag> {
    let mut flags: Vec<TrustFlag> = explicit
        .iter()
        .filter(|f| f.content_id == content_id && f.raised_at <= now && f.is_open_at(now))
        .map(|f| TrustFlag {
            flag_type: f.flag_type,
            source: FlagSource::Explicit {
                flag_id: f.id.clone(),
            },
            raised_at: f.raised_at,
        })
        .collect();

    for attestation in attestations.iter().filter(|a| a.content_id == content_id) {
        let Some(evidence) = &attestation.evidence else {
            continue;
        };
        for flag_type in &evidence.raised_flags {
            if resolved_explicitly(content_id, *flag_type, attestation.granted_at, explicit, now) {
                continue;
            }
            flags.push(TrustFlag {
                flag_type: *flag_type,
                source: FlagSource::Attestation {
                    attestation_id: attestation.id.clone(),
                },
                raised_at: attestation.granted_at,
            });
        }
    }

    flags.sort_by(|a, b| {
        a.raised_at
            .cmp(&b.raised_at)
            .then(a.flag_type.cmp(&b.flag_type))
    });
    flags
}

/// Whether an explicit record of the same type, raised no earlier than the
/// evidence flag, has been resolved by `now`.
fn resolved_explicitly(
    content_id: &str,
    flag_type: FlagType,
    raised_at: DateTime<Utc>,
    explicit: &[ContentFlag],
    now: DateTime<Utc>,
) -> bool {
    explicit.iter().any(|f| {
        f.content_id == content_id
            && f.flag_type == flag_type
            && f.raised_at >= raised_at
            && !f.is_open_at(now)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{
        AttestationEvidence, AttestationGrantor, AttestationStatus, AttestationType, Extensions,
        GrantorType, ReachLevel,
    };
    use chrono::{Duration, TimeZone};

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, day, 0, 0, 0).unwrap()
    }

    fn flag(id: &str, kind: FlagType, raised: u32, resolved: Option<u32>) -> ContentFlag {
        ContentFlag {
            id: id.into(),
            content_id: "c1".into(),
            flag_type: kind,
            raised_by: "reviewer".into(),
            raised_at: t(raised),
            reason: None,
            resolved_at: resolved.map(t),
        }
    }

    fn attestation_with_flags(status: AttestationStatus, flags: Vec<FlagType>) -> Attestation {
        Attestation {
            id: "att-1".into(),
            content_id: "c1".into(),
            attestation_type: AttestationType::PeerReviewed,
            reach_granted: ReachLevel::Federated,
            granted_by: AttestationGrantor {
                grantor_id: "peer".into(),
                grantor_type: GrantorType::Peer,
                display_name: None,
            },
            granted_at: t(2),
            expires_at: None,
            status,
            revocation: None,
            superseded_by: None,
            superseded_at: None,
            evidence: Some(AttestationEvidence {
                raised_flags: flags,
                ..Default::default()
            }),
            scope: None,
            extensions: Extensions::new(),
        }
    }

    #[test]
    fn test_resolved_explicit_flags_excluded() {
        let explicit = vec![
            flag("f1", FlagType::Disputed, 1, None),
            flag("f2", FlagType::Outdated, 1, Some(3)),
        ];
        let flags = collect_flags("c1", &[], &explicit, t(10));
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type, FlagType::Disputed);
    }

    #[test]
    fn test_evidence_flags_survive_revocation() {
        let att = attestation_with_flags(AttestationStatus::Revoked, vec![FlagType::UnderReview]);
        let flags = collect_flags("c1", &[att], &[], t(10));
        assert_eq!(flags.len(), 1);
        assert_eq!(
            flags[0].source,
            FlagSource::Attestation {
                attestation_id: "att-1".into()
            }
        );
    }

    #[test]
    fn test_evidence_flag_closed_by_explicit_resolution() {
        let att = attestation_with_flags(AttestationStatus::Active, vec![FlagType::UnderReview]);
        let explicit = vec![flag("f1", FlagType::UnderReview, 3, Some(5))];
        assert!(collect_flags("c1", &[att.clone()], &explicit, t(10)).is_empty());
        // Before the resolution both the record and the evidence flag are open.
        assert_eq!(collect_flags("c1", &[att], &explicit, t(4)).len(), 2);
    }

    #[test]
    fn test_future_flags_ignored() {
        let explicit = vec![flag("f1", FlagType::Disputed, 20, None)];
        assert!(collect_flags("c1", &[], &explicit, t(10)).is_empty());
        assert_eq!(
            collect_flags("c1", &[], &explicit, t(20) + Duration::hours(1)).len(),
            1
        );
    }
}
