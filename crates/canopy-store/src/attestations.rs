// crates/canopy-store/src/attestations.rs
//
// Append-only attestation event log plus explicit flag records.
//
// The log keeps every event as written. Records are the fold of the log:
// `apply_event` validates each event against the records so far, so an
// illegal transition is rejected at append time and never reaches the log.

use std::sync::RwLock;

use chrono::{DateTime, Utc};

use canopy_core::{
    apply_event, Attestation, AttestationEvent, AttestationStore, CanopyError, ContentFlag,
};

use crate::poisoned;

#[derive(Debug, Default)]
struct AttestationLog {
    events: Vec<AttestationEvent>,
    records: Vec<Attestation>,
}

/// In-memory `AttestationStore`.
#[derive(Debug, Default)]
pub struct InMemoryAttestationStore {
    log: RwLock<AttestationLog>,
    flags: RwLock<Vec<ContentFlag>>,
}

impl InMemoryAttestationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event appended so far, in order.
    pub fn events(&self) -> Result<Vec<AttestationEvent>, CanopyError> {
        Ok(self.log.read().map_err(poisoned)?.events.clone())
    }

    pub fn len(&self) -> usize {
        self.log.read().map(|log| log.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttestationStore for InMemoryAttestationStore {
    fn list_attestations(&self, content_id: &str) -> Result<Vec<Attestation>, CanopyError> {
        let log = self.log.read().map_err(poisoned)?;
        Ok(log
            .records
            .iter()
            .filter(|a| a.content_id == content_id)
            .cloned()
            .collect())
    }

    fn append(&self, event: AttestationEvent) -> Result<(), CanopyError> {
        let mut log = self.log.write().map_err(poisoned)?;
        apply_event(&mut log.records, &event)?;
        tracing::debug!(attestation_id = event.attestation_id(), "Attestation event appended");
        log.events.push(event);
        Ok(())
    }

    fn list_flags(&self, content_id: &str) -> Result<Vec<ContentFlag>, CanopyError> {
        let flags = self.flags.read().map_err(poisoned)?;
        Ok(flags
            .iter()
            .filter(|f| f.content_id == content_id)
            .cloned()
            .collect())
    }

    fn raise_flag(&self, flag: ContentFlag) -> Result<(), CanopyError> {
        if flag.id.trim().is_empty() || flag.content_id.trim().is_empty() {
            return Err(CanopyError::Validation("Flag id and content id are required".into()));
        }
        let mut flags = self.flags.write().map_err(poisoned)?;
        if flags.iter().any(|f| f.id == flag.id) {
            return Err(CanopyError::Validation(format!("Flag {} already exists", flag.id)));
        }
        tracing::debug!(flag_id = %flag.id, content_id = %flag.content_id, flag_type = %flag.flag_type, "Flag raised");
        flags.push(flag);
        Ok(())
    }

    fn resolve_flag(&self, flag_id: &str, resolved_at: DateTime<Utc>) -> Result<ContentFlag, CanopyError> {
        let mut flags = self.flags.write().map_err(poisoned)?;
        let flag = flags
            .iter_mut()
            .find(|f| f.id == flag_id)
            .ok_or_else(|| CanopyError::NotFound(format!("Flag {}", flag_id)))?;
        if flag.resolved_at.is_some() {
            return Err(CanopyError::Validation(format!("Flag {} is already resolved", flag_id)));
        }
        if resolved_at < flag.raised_at {
            return Err(CanopyError::Validation(format!(
                "Flag {} cannot be resolved before it was raised",
                flag_id
            )));
        }
        flag.resolved_at = Some(resolved_at);
        Ok(flag.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{
        AttestationGrantor, AttestationRevocation, AttestationStatus, AttestationType, Extensions,
        FlagType, GrantorType, ReachLevel,
    };
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()
    }

    fn grant(id: &str, content_id: &str) -> AttestationEvent {
        AttestationEvent::Granted {
            attestation: Attestation {
                id: id.into(),
                content_id: content_id.into(),
                attestation_type: AttestationType::StewardApproved,
                reach_granted: ReachLevel::Community,
                granted_by: AttestationGrantor {
                    grantor_id: "steward".into(),
                    grantor_type: GrantorType::Steward,
                    display_name: None,
                },
                granted_at: t0(),
                expires_at: None,
                status: AttestationStatus::Active,
                revocation: None,
                superseded_by: None,
                superseded_at: None,
                evidence: None,
                scope: None,
                extensions: Extensions::new(),
            },
        }
    }

    #[test]
    fn test_revoke_restates_without_losing_history() {
        let store = InMemoryAttestationStore::new();
        store.append(grant("a1", "c1")).unwrap();
        store
            .append(AttestationEvent::Revoked {
                attestation_id: "a1".into(),
                revocation: AttestationRevocation {
                    revoked_by: "council".into(),
                    revoked_at: t0() + Duration::days(1),
                    reason: "plagiarism".into(),
                },
            })
            .unwrap();

        let records = store.list_attestations("c1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttestationStatus::Revoked);
        assert_eq!(store.events().unwrap().len(), 2);
    }

    #[test]
    fn test_illegal_transition_not_logged() {
        let store = InMemoryAttestationStore::new();
        store.append(grant("a1", "c1")).unwrap();
        let revoke = AttestationEvent::Revoked {
            attestation_id: "a1".into(),
            revocation: AttestationRevocation {
                revoked_by: "council".into(),
                revoked_at: t0(),
                reason: "x".into(),
            },
        };
        store.append(revoke.clone()).unwrap();
        assert!(matches!(store.append(revoke), Err(CanopyError::Validation(_))));
        assert_eq!(store.events().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_attestation_not_found() {
        let store = InMemoryAttestationStore::new();
        let result = store.append(AttestationEvent::Superseded {
            attestation_id: "missing".into(),
            superseded_by: "a2".into(),
            at: t0(),
        });
        assert!(matches!(result, Err(CanopyError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_scoped_to_content() {
        let store = InMemoryAttestationStore::new();
        store.append(grant("a1", "c1")).unwrap();
        store.append(grant("a2", "c2")).unwrap();
        assert_eq!(store.list_attestations("c1").unwrap().len(), 1);
        assert!(store.list_attestations("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_flag_lifecycle() {
        let store = InMemoryAttestationStore::new();
        let flag = ContentFlag {
            id: "f1".into(),
            content_id: "c1".into(),
            flag_type: FlagType::Disputed,
            raised_by: "member".into(),
            raised_at: t0(),
            reason: None,
            resolved_at: None,
        };
        store.raise_flag(flag.clone()).unwrap();
        assert!(store.raise_flag(flag).is_err());

        let resolved = store.resolve_flag("f1", t0() + Duration::hours(2)).unwrap();
        assert_eq!(resolved.resolved_at, Some(t0() + Duration::hours(2)));
        assert!(store.resolve_flag("f1", t0() + Duration::hours(3)).is_err());
        assert!(matches!(
            store.resolve_flag("f9", t0()),
            Err(CanopyError::NotFound(_))
        ));
        assert_eq!(store.list_flags("c1").unwrap().len(), 1);
    }
}
