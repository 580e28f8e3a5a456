// crates/canopy-stewardship/src/lib.rs
//
// canopy-stewardship: Stewardship ledger for the Canopy governance engine.
//
// Maintains the ratio-based allocations that decide who receives credit for
// a content item. The live ratios of every content item sum to 1.0 at every
// observable instant: writes that would break the sum are rejected before
// commit, disputes freeze a share without redistributing it, and resolution
// swaps a disputed allocation for its replacements in one atomic write.

pub mod ledger;
pub mod recognition;
pub mod view;

pub use ledger::{
    DisputeResolution, NewAllocation, RatioAdjustment, ReplacementAllocation, StewardshipLedger,
    RATIO_TOLERANCE,
};
pub use recognition::{split_recognition, RecognitionShare, RecognitionSplit};
pub use view::{count_by_state, live_ratio_sum, primary_allocation, ContentStewardship};
