// crates/canopy-reach/src/lib.rs
//
// canopy-reach: Reach resolution for the Canopy governance engine.
//
// Aggregates revocable, expirable attestation records and open flags into a
// derived trust profile: the effective reach tier a content item may be
// discovered at, a bounded trust score, and the flags currently capping it.
// Profiles are recomputed on every read and never stored as authority.

pub mod flags;
pub mod requirements;
pub mod resolver;
pub mod trust_score;

pub use flags::{collect_flags, FlagSource, TrustFlag};
pub use requirements::{
    AttestationRequirement, ReachEvidence, ReachRequirement, ReachRequirementTable, ReachShortfall,
    SCORE_EPSILON,
};
pub use resolver::{ContentTrustProfile, ReachResolver};
pub use trust_score::{TrustScorePolicy, WeightedTrustPolicy};
