// crates/canopy-core/src/traits.rs
//
// Repository interfaces consumed by the resolvers.
//
// Implementations are passed into each resolver by reference and scoped to a
// request or test case. All methods are synchronous; a backend that fails
// reports `CanopyError::Storage`.

use crate::access::RequesterCredentials;
use crate::attestation::{Attestation, AttestationEvent};
use crate::error::CanopyError;
use crate::feedback::{FeedbackProfile, ProfileTemplate, SensitivityCategory};
use crate::flag::ContentFlag;
use crate::keyed_lock::KeyedLocks;
use crate::stewardship::StewardshipAllocation;

use chrono::{DateTime, Utc};

/// Append-only attestation and flag log.
pub trait AttestationStore: Send + Sync {
    /// All attestation records for a content item, with status re-stated by
    /// later revoke/supersede events. Unknown content yields an empty list.
    fn list_attestations(&self, content_id: &str) -> Result<Vec<Attestation>, CanopyError>;

    /// Append a grant, revoke, or supersede event. Illegal transitions are rejected.
    fn append(&self, event: AttestationEvent) -> Result<(), CanopyError>;

    /// All flag records for a content item, open or resolved.
    fn list_flags(&self, content_id: &str) -> Result<Vec<ContentFlag>, CanopyError>;

    /// Record a new flag.
    fn raise_flag(&self, flag: ContentFlag) -> Result<(), CanopyError>;

    /// Re-state a flag as resolved at `resolved_at`.
    fn resolve_flag(
        &self,
        flag_id: &str,
        resolved_at: DateTime<Utc>,
    ) -> Result<ContentFlag, CanopyError>;
}

/// Stewardship allocation store keyed by content id.
pub trait AllocationStore: Send + Sync {
    /// Every allocation ever recorded for a content item, superseded ones included.
    fn list_for_content(&self, content_id: &str) -> Result<Vec<StewardshipAllocation>, CanopyError>;

    /// Look up a single allocation.
    fn get(&self, allocation_id: &str) -> Result<Option<StewardshipAllocation>, CanopyError>;

    /// Every allocation held by a steward across content items.
    fn list_for_steward(&self, steward_id: &str) -> Result<Vec<StewardshipAllocation>, CanopyError>;

    /// Insert or replace a batch of allocations for one content item as a
    /// single atomic write. Either every record lands or none does.
    fn commit(
        &self,
        content_id: &str,
        allocations: Vec<StewardshipAllocation>,
    ) -> Result<(), CanopyError>;

    /// Per-content writer slots shared by every ledger writing to this store.
    fn writer_locks(&self) -> &KeyedLocks;
}

/// Feedback profile store keyed by content id.
pub trait ProfileStore: Send + Sync {
    fn get(&self, content_id: &str) -> Result<Option<FeedbackProfile>, CanopyError>;

    /// Insert or replace the profile for its content id.
    fn put(&self, profile: FeedbackProfile) -> Result<(), CanopyError>;

    /// Per-content writer slots shared by every registry writing to this store.
    fn writer_locks(&self) -> &KeyedLocks;
}

/// Catalog of initial profile templates keyed by sensitivity category.
pub trait ProfileTemplateCatalog: Send + Sync {
    fn template_for(&self, category: SensitivityCategory) -> Option<ProfileTemplate>;
}

/// Supplier of requester credentials.
pub trait CredentialProvider: Send + Sync {
    /// Credentials for a requester, or `None` when the requester is unknown.
    fn credentials_for(&self, requester_id: &str) -> Result<Option<RequesterCredentials>, CanopyError>;
}
