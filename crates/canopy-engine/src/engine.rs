// crates/canopy-engine/src/engine.rs
//
// GovernanceEngine: one entry point over the four resolvers.
//
// Reads (trust profiles, access checks, stewardship views, path composition)
// recompute from the stores on every call. Writes go through the stores'
// append paths and the per-content writer locks held by the ledger and the
// feedback registry.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use canopy_access::{check_access, check_access_with_reach, AccessCheckResult, AccessRequirement};
use canopy_core::{
    new_record_id, AllocationStore, Attestation, AttestationEvent, AttestationRevocation,
    AttestationStore, CanopyError, ChangeTrigger, ContentFlag, CredentialProvider,
    FeedbackMechanism, FeedbackProfile, FlagType, ProfileChange, ProfileStore,
    ProfileTemplateCatalog, RequesterCredentials, SensitivityCategory,
};
use canopy_feedback::{compose_for_path, ComposedFeedbackProfile, FeedbackRegistry};
use canopy_reach::{ContentTrustProfile, ReachRequirementTable, ReachResolver};
use canopy_stewardship::StewardshipLedger;

use crate::config::EngineConfig;

/// Repositories the engine reads and writes through.
#[derive(Clone, Copy)]
pub struct EngineStores<'a> {
    pub attestations: &'a dyn AttestationStore,
    pub allocations: &'a dyn AllocationStore,
    pub profiles: &'a dyn ProfileStore,
    pub templates: &'a dyn ProfileTemplateCatalog,
    pub credentials: &'a dyn CredentialProvider,
}

/// Facade over reach, access, stewardship, and feedback.
pub struct GovernanceEngine<'a> {
    config: EngineConfig,
    attestations: &'a dyn AttestationStore,
    credentials: &'a dyn CredentialProvider,
    reach: ReachResolver,
    ledger: StewardshipLedger<'a, dyn AllocationStore + 'a>,
    feedback: FeedbackRegistry<'a, dyn ProfileStore + 'a, dyn ProfileTemplateCatalog + 'a>,
}

impl<'a> GovernanceEngine<'a> {
    pub fn new(config: EngineConfig, stores: EngineStores<'a>) -> Self {
        Self::with_requirements(config, stores, ReachRequirementTable::default())
    }

    /// Engine with a custom reach requirement table.
    pub fn with_requirements(
        config: EngineConfig,
        stores: EngineStores<'a>,
        requirements: ReachRequirementTable,
    ) -> Self {
        let reach = ReachResolver::new(requirements, Box::new(config.trust.policy()));
        let ledger =
            StewardshipLedger::with_options(stores.allocations, config.ratio_tolerance, config.lock_policy);
        let feedback =
            FeedbackRegistry::with_lock_policy(stores.profiles, stores.templates, config.lock_policy);
        Self {
            config,
            attestations: stores.attestations,
            credentials: stores.credentials,
            reach,
            ledger,
            feedback,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reach(&self) -> &ReachResolver {
        &self.reach
    }

    /// The stewardship ledger: create, dispute, review, resolve, recognition.
    pub fn stewardship(&self) -> &StewardshipLedger<'a, dyn AllocationStore + 'a> {
        &self.ledger
    }

    /// The feedback registry: instantiate, resolve, apply changes.
    pub fn feedback(&self) -> &FeedbackRegistry<'a, dyn ProfileStore + 'a, dyn ProfileTemplateCatalog + 'a> {
        &self.feedback
    }

    // --- Reach ---

    /// Trust profile of a content item as of `now`.
    pub fn trust_profile(&self, content_id: &str, now: DateTime<Utc>) -> Result<ContentTrustProfile, CanopyError> {
        let attestations = self.attestations.list_attestations(content_id)?;
        let flags = self.attestations.list_flags(content_id)?;
        Ok(self
            .reach
            .resolve_trust_profile(content_id, &attestations, &flags, now))
    }

    pub fn grant_attestation(&self, attestation: Attestation) -> Result<(), CanopyError> {
        let id = attestation.id.clone();
        let content_id = attestation.content_id.clone();
        let kind = attestation.attestation_type;
        self.attestations.append(AttestationEvent::Granted { attestation })?;
        tracing::info!(attestation_id = %id, content_id = %content_id, kind = %kind, "Attestation granted");
        Ok(())
    }

    pub fn revoke_attestation(
        &self,
        attestation_id: &str,
        revocation: AttestationRevocation,
    ) -> Result<(), CanopyError> {
        self.attestations.append(AttestationEvent::Revoked {
            attestation_id: attestation_id.to_string(),
            revocation,
        })?;
        tracing::info!(attestation_id, "Attestation revoked");
        Ok(())
    }

    pub fn supersede_attestation(
        &self,
        attestation_id: &str,
        superseded_by: &str,
        at: DateTime<Utc>,
    ) -> Result<(), CanopyError> {
        self.attestations.append(AttestationEvent::Superseded {
            attestation_id: attestation_id.to_string(),
            superseded_by: superseded_by.to_string(),
            at,
        })?;
        tracing::info!(attestation_id, superseded_by, "Attestation superseded");
        Ok(())
    }

    /// Raise an explicit flag on content.
    pub fn raise_flag(
        &self,
        content_id: &str,
        flag_type: FlagType,
        raised_by: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ContentFlag, CanopyError> {
        let flag = ContentFlag {
            id: new_record_id(),
            content_id: content_id.to_string(),
            flag_type,
            raised_by: raised_by.to_string(),
            raised_at: now,
            reason,
            resolved_at: None,
        };
        self.attestations.raise_flag(flag.clone())?;
        tracing::info!(content_id, flag_type = %flag_type, flag_id = %flag.id, "Flag raised");
        Ok(flag)
    }

    pub fn resolve_flag(&self, flag_id: &str, now: DateTime<Utc>) -> Result<ContentFlag, CanopyError> {
        let flag = self.attestations.resolve_flag(flag_id, now)?;
        tracing::info!(flag_id, content_id = %flag.content_id, "Flag resolved");
        Ok(flag)
    }

    // --- Access ---

    /// Ordered access checks without reach.
    pub fn check_access(&self, requester: &RequesterCredentials, requirement: &AccessRequirement) -> AccessCheckResult {
        check_access(requester, requirement)
    }

    /// Ordered access checks followed by the content's effective reach.
    pub fn check_content_access(
        &self,
        requester: &RequesterCredentials,
        requirement: &AccessRequirement,
        content_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessCheckResult, CanopyError> {
        let profile = self.trust_profile(content_id, now)?;
        Ok(check_access_with_reach(requester, requirement, &profile))
    }

    /// Look up a requester through the credential provider and check access.
    /// Unknown or absent requesters are evaluated as anonymous visitors.
    pub fn check_access_for(
        &self,
        requester_id: Option<&str>,
        requirement: &AccessRequirement,
        content_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessCheckResult, CanopyError> {
        let requester = match requester_id {
            Some(id) => self
                .credentials
                .credentials_for(id)?
                .unwrap_or_else(RequesterCredentials::anonymous),
            None => RequesterCredentials::anonymous(),
        };
        self.check_content_access(&requester, requirement, content_id, now)
    }

    // --- Feedback ---

    /// Instantiate a profile, falling back to the configured default category.
    pub fn instantiate_profile(
        &self,
        content_id: &str,
        category: Option<SensitivityCategory>,
        determined_by: &str,
        now: DateTime<Utc>,
    ) -> Result<FeedbackProfile, CanopyError> {
        let category = category.unwrap_or(self.config.default_category);
        self.feedback.instantiate(content_id, category, determined_by, now)
    }

    pub fn feedback_profile(&self, content_id: &str) -> Result<FeedbackProfile, CanopyError> {
        self.feedback.resolve(content_id)
    }

    pub fn apply_profile_change(
        &self,
        content_id: &str,
        trigger: ChangeTrigger,
        new_mechanisms: BTreeSet<FeedbackMechanism>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<ProfileChange, CanopyError> {
        self.feedback
            .apply_change(content_id, trigger, new_mechanisms, reason, now)
    }

    /// Compose the feedback profiles of a path's content items, in any order.
    /// Items without a profile contribute the strict default.
    pub fn compose_path(&self, content_ids: &[String]) -> Result<ComposedFeedbackProfile, CanopyError> {
        let profiles = content_ids
            .iter()
            .map(|id| self.feedback.resolve(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(compose_for_path(&profiles))
    }
}
