// crates/canopy-access/src/lib.rs
//
// canopy-access: Access evaluation for the Canopy governance engine.
//
// Combines a requester's credentials with a content item's access requirement
// (and optionally its resolved trust profile) into a single allow/deny
// decision. Checks run in a fixed order so the first failure is always the
// most actionable one, and identical inputs always produce identical results.

pub mod evaluator;
pub mod requirement;

pub use evaluator::{check_access, check_access_with_reach, AccessCheckResult, DenialReason, RequiredAction};
pub use requirement::{AccessRequirement, RequiredAttestations};
