// crates/canopy-store/src/snapshot.rs
//
// JSON snapshot used to seed a set of in-memory stores.
//
// Attestations may be given either as records or as raw events. A record in a
// terminal status is replayed as a grant followed by the matching revoke or
// supersede event, so every record still passes through the same transition
// checks as a live append. Allocations and profiles are checked against the
// ledger and history invariants before anything is written.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use canopy_core::{
    AllocationStore, Attestation, AttestationEvent, AttestationStatus, AttestationStore,
    CanopyError, ContentFlag, FeedbackProfile, ProfileStore, RequesterCredentials,
    StewardshipAllocation, RATIO_TOLERANCE,
};

use crate::{
    InMemoryAllocationStore, InMemoryAttestationStore, InMemoryCredentialDirectory,
    InMemoryProfileStore,
};

/// Serializable contents of a full set of stores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub attestations: Vec<Attestation>,
    /// Applied after `attestations`, in order.
    #[serde(default)]
    pub events: Vec<AttestationEvent>,
    #[serde(default)]
    pub flags: Vec<ContentFlag>,
    #[serde(default)]
    pub allocations: Vec<StewardshipAllocation>,
    #[serde(default)]
    pub profiles: Vec<FeedbackProfile>,
    #[serde(default)]
    pub credentials: Vec<RequesterCredentials>,
}

/// One of each in-memory store.
#[derive(Debug, Default)]
pub struct Stores {
    pub attestations: InMemoryAttestationStore,
    pub allocations: InMemoryAllocationStore,
    pub profiles: InMemoryProfileStore,
    pub credentials: InMemoryCredentialDirectory,
}

impl StoreSnapshot {
    pub fn from_json(json: &str) -> Result<Self, CanopyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build fresh stores holding the snapshot's contents.
    pub fn into_stores(self) -> Result<Stores, CanopyError> {
        let mut by_content: BTreeMap<String, Vec<StewardshipAllocation>> = BTreeMap::new();
        for allocation in self.allocations {
            by_content
                .entry(allocation.content_id.clone())
                .or_default()
                .push(allocation);
        }
        for (content_id, batch) in &by_content {
            check_live_ratios(content_id, batch)?;
        }
        for profile in &self.profiles {
            check_profile_history(profile)?;
        }

        let stores = Stores::default();

        for record in self.attestations {
            for event in replay(record)? {
                stores.attestations.append(event)?;
            }
        }
        for event in self.events {
            stores.attestations.append(event)?;
        }
        for flag in self.flags {
            stores.attestations.raise_flag(flag)?;
        }

        for (content_id, batch) in by_content {
            stores.allocations.commit(&content_id, batch)?;
        }

        for profile in self.profiles {
            stores.profiles.put(profile)?;
        }
        for credentials in self.credentials {
            stores.credentials.insert(credentials)?;
        }

        tracing::debug!(attestations = stores.attestations.len(), "Loaded store snapshot");
        Ok(stores)
    }
}

/// Live ratios of one content item must sum to 1.0.
fn check_live_ratios(content_id: &str, allocations: &[StewardshipAllocation]) -> Result<(), CanopyError> {
    let total: f64 = allocations
        .iter()
        .filter(|a| a.is_live())
        .map(|a| a.ratio)
        .sum();
    if (total - 1.0).abs() > RATIO_TOLERANCE {
        return Err(CanopyError::InvariantViolation(format!(
            "Seeded live ratios for {} sum to {:.6}, expected 1.0",
            content_id, total
        )));
    }
    Ok(())
}

/// A profile's permitted set is its last history entry's, and never overlaps
/// its prohibited set.
fn check_profile_history(profile: &FeedbackProfile) -> Result<(), CanopyError> {
    if let Some(latest) = profile.latest_change() {
        if latest.new_mechanisms != profile.permitted_mechanisms {
            return Err(CanopyError::InvariantViolation(format!(
                "Profile for {} permits a set that differs from its last history entry",
                profile.content_id
            )));
        }
    }
    if !profile.permitted_mechanisms.is_disjoint(&profile.prohibited_mechanisms) {
        return Err(CanopyError::InvariantViolation(format!(
            "Profile for {} permits a prohibited mechanism",
            profile.content_id
        )));
    }
    Ok(())
}

/// Events that reproduce `record` through the append path.
fn replay(record: Attestation) -> Result<Vec<AttestationEvent>, CanopyError> {
    let status = record.status;
    let revocation = record.revocation.clone();
    let superseded_by = record.superseded_by.clone();
    let at = record.superseded_at.unwrap_or(record.granted_at);
    let id = record.id.clone();

    let mut granted = record;
    granted.status = AttestationStatus::Active;
    granted.revocation = None;
    granted.superseded_by = None;
    granted.superseded_at = None;

    let mut events = vec![AttestationEvent::Granted {
        attestation: granted.clone(),
    }];
    match status {
        AttestationStatus::Active => {}
        AttestationStatus::Expired => {
            if granted.expires_at.is_none() {
                return Err(CanopyError::Validation(format!(
                    "Attestation {} is marked expired but has no expiry",
                    id
                )));
            }
        }
        AttestationStatus::Revoked => {
            let revocation = revocation.ok_or_else(|| {
                CanopyError::Validation(format!("Revoked attestation {} has no revocation record", id))
            })?;
            events.push(AttestationEvent::Revoked {
                attestation_id: id,
                revocation,
            });
        }
        AttestationStatus::Superseded => {
            let superseded_by = superseded_by.ok_or_else(|| {
                CanopyError::Validation(format!("Superseded attestation {} names no successor", id))
            })?;
            events.push(AttestationEvent::Superseded {
                attestation_id: id,
                superseded_by,
                at,
            });
        }
    }
    Ok(events)
}
