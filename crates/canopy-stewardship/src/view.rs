// crates/canopy-stewardship/src/view.rs
//
// Aggregate stewardship view of a content item.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use canopy_core::{GovernanceState, StewardshipAllocation};

/// Read model of a content item's current stewardship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStewardship {
    pub content_id: String,
    /// Live allocations (active, disputed, or pending review), highest ratio first.
    pub allocations: Vec<StewardshipAllocation>,
    /// Sum of live ratios. 1.0 within tolerance whenever any allocation exists.
    pub total_ratio: f64,
    /// True when any live allocation is disputed or pending review.
    pub has_disputes: bool,
    /// Ratio currently frozen by open disputes.
    pub contested_ratio: f64,
    #[serde(default)]
    pub primary_steward: Option<String>,
    #[serde(default)]
    pub primary_allocation_id: Option<String>,
}

impl ContentStewardship {
    /// Build the view from every allocation recorded for `content_id`.
    pub fn from_allocations(content_id: &str, allocations: &[StewardshipAllocation]) -> Self {
        let mut live: Vec<StewardshipAllocation> = allocations
            .iter()
            .filter(|a| a.content_id == content_id && a.is_live())
            .cloned()
            .collect();
        live.sort_by(|a, b| {
            b.ratio
                .total_cmp(&a.ratio)
                .then(a.effective_from.cmp(&b.effective_from))
                .then(a.id.cmp(&b.id))
        });

        let primary = primary_allocation(&live);
        Self {
            content_id: content_id.to_string(),
            total_ratio: live_ratio_sum(&live),
            has_disputes: live.iter().any(|a| a.governance_state.is_contested()),
            contested_ratio: live
                .iter()
                .filter(|a| a.governance_state.is_contested())
                .map(|a| a.ratio)
                .sum(),
            primary_steward: primary.map(|a| a.steward_id.clone()),
            primary_allocation_id: primary.map(|a| a.id.clone()),
            allocations: live,
        }
    }

    pub fn steward_count(&self) -> usize {
        self.allocations.len()
    }
}

/// Sum of ratios over live allocations.
pub fn live_ratio_sum(allocations: &[StewardshipAllocation]) -> f64 {
    allocations
        .iter()
        .filter(|a| a.is_live())
        .map(|a| a.ratio)
        .sum()
}

/// The active allocation with the highest ratio. Ties go to the earliest
/// `effective_from`, then the lowest id.
pub fn primary_allocation(allocations: &[StewardshipAllocation]) -> Option<&StewardshipAllocation> {
    allocations
        .iter()
        .filter(|a| a.is_live() && a.governance_state == GovernanceState::Active)
        .min_by(|a, b| {
            b.ratio
                .total_cmp(&a.ratio)
                .then(a.effective_from.cmp(&b.effective_from))
                .then(a.id.cmp(&b.id))
        })
}

/// Number of allocations in each governance state, superseded ones included.
/// Every state appears in the map, possibly with a zero count.
pub fn count_by_state(allocations: &[StewardshipAllocation]) -> BTreeMap<GovernanceState, usize> {
    let mut counts: BTreeMap<GovernanceState, usize> =
        GovernanceState::ALL.iter().map(|s| (*s, 0)).collect();
    for allocation in allocations {
        *counts.entry(allocation.governance_state).or_insert(0) += 1;
    }
    counts
}
