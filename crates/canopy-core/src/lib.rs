// crates/canopy-core/src/lib.rs
//
// canopy-core: Core vocabularies, record shapes, and repository traits for the
// Canopy trust, reach, and stewardship governance engine.
//
// This is the leaf crate that every other crate in the workspace depends on.
// It defines the closed vocabularies (reach levels, attestation statuses,
// governance states, feedback mechanisms), the append-only record shapes the
// resolvers consume, the error taxonomy, and the repository interfaces that
// callers implement and pass into each resolver by reference.

pub mod access;
pub mod attestation;
pub mod error;
pub mod extension;
pub mod feedback;
pub mod flag;
pub mod keyed_lock;
pub mod reach;
pub mod stewardship;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use canopy_core::Attestation;`

// Reach and access vocabulary
pub use access::{AccessLevel, RequesterCredentials, RequirementMode};
pub use reach::ReachLevel;

// Attestation records
pub use attestation::{
    apply_event, Attestation, AttestationEvent, AttestationEvidence, AttestationGrantor, AttestationRevocation,
    AttestationScope, AttestationStatus, AttestationType, GrantorType,
};

// Flags
pub use flag::{ContentFlag, FlagType};

// Stewardship records
pub use stewardship::{
    AllocationMethod, ContributionType, DisputeRecord, GovernanceState, Ratification,
    StewardshipAllocation, RATIO_TOLERANCE,
};

// Feedback profile records
pub use feedback::{
    min_friction, ChangeDirection, ChangeTrigger, FeedbackMechanism, FeedbackProfile, FrictionTier,
    ProfileChange, ProfileDetermination, ProfileTemplate, SensitivityCategory,
};

// Extension point
pub use extension::{ExtensionValue, Extensions};

// Error type
pub use error::{CanopyError, Result};

// Concurrency
pub use keyed_lock::{KeyGuard, KeyedLocks, LockPolicy};

// Traits
pub use traits::{
    AllocationStore, AttestationStore, CredentialProvider, ProfileStore, ProfileTemplateCatalog,
};

/// Generate a new time-ordered record identifier (UUID v7, hyphenated).
pub fn new_record_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
