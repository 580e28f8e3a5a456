// crates/canopy-stewardship/src/recognition.rs
//
// Recognition split: divides an incoming recognition amount across a content
// item's live allocations by ratio.
//
// Only active allocations receive their share. The share of a disputed or
// pending-review allocation is withheld and reported; it is never handed to
// the other stewards, so a dispute cannot inflate anyone else's take.

use serde::{Deserialize, Serialize};

use canopy_core::{CanopyError, StewardshipAllocation};

/// One allocation's portion of a recognition amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionShare {
    pub allocation_id: String,
    pub steward_id: String,
    pub amount: f64,
}

/// Result of splitting a recognition amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionSplit {
    pub content_id: String,
    pub amount: f64,
    /// Paid to active allocations.
    pub shares: Vec<RecognitionShare>,
    /// Held back from contested allocations.
    pub withheld: Vec<RecognitionShare>,
}

impl RecognitionSplit {
    pub fn distributed_total(&self) -> f64 {
        self.shares.iter().map(|s| s.amount).sum()
    }

    pub fn withheld_total(&self) -> f64 {
        self.withheld.iter().map(|s| s.amount).sum()
    }
}

/// Split `amount` across the live allocations of `content_id`.
///
/// # Errors
/// `Validation` if `amount` is negative or not finite.
pub fn split_recognition(
    content_id: &str,
    allocations: &[StewardshipAllocation],
    amount: f64,
) -> Result<RecognitionSplit, CanopyError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(CanopyError::Validation(format!(
            "Recognition amount must be a finite non-negative number, got {}",
            amount
        )));
    }

    let mut shares = Vec::new();
    let mut withheld = Vec::new();
    for allocation in allocations
        .iter()
        .filter(|a| a.content_id == content_id && a.is_live())
    {
        let share = RecognitionShare {
            allocation_id: allocation.id.clone(),
            steward_id: allocation.steward_id.clone(),
            amount: amount * allocation.ratio,
        };
        if allocation.accrues_recognition() {
            shares.push(share);
        } else {
            withheld.push(share);
        }
    }

    Ok(RecognitionSplit {
        content_id: content_id.to_string(),
        amount,
        shares,
        withheld,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{AllocationMethod, ContributionType, Extensions, GovernanceState};
    use chrono::{TimeZone, Utc};

    fn alloc(id: &str, ratio: f64, state: GovernanceState) -> StewardshipAllocation {
        StewardshipAllocation {
            id: id.into(),
            content_id: "content-1".into(),
            steward_id: format!("steward-{}", id),
            ratio,
            method: AllocationMethod::Negotiated,
            contribution_type: ContributionType::Curator,
            contribution_evidence: None,
            governance_state: state,
            dispute: None,
            ratification: None,
            effective_from: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            effective_until: None,
            superseded_by: None,
            recognition_accumulated: 0.0,
            last_recognition_at: None,
            note: None,
            extensions: Extensions::new(),
        }
    }

    #[test]
    fn test_disputed_share_withheld_not_redistributed() {
        let allocs = vec![
            alloc("1", 0.5, GovernanceState::Active),
            alloc("2", 0.3, GovernanceState::Disputed),
            alloc("3", 0.2, GovernanceState::Active),
        ];
        let split = split_recognition("content-1", &allocs, 100.0).unwrap();
        assert_eq!(split.shares.len(), 2);
        assert!((split.shares[0].amount - 50.0).abs() < 1e-9);
        assert!((split.shares[1].amount - 20.0).abs() < 1e-9);
        assert_eq!(split.withheld.len(), 1);
        assert!((split.withheld_total() - 30.0).abs() < 1e-9);
        assert!((split.distributed_total() + split.withheld_total() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_superseded_gets_nothing() {
        let allocs = vec![
            alloc("1", 1.0, GovernanceState::Superseded),
            alloc("2", 1.0, GovernanceState::Active),
        ];
        let split = split_recognition("content-1", &allocs, 10.0).unwrap();
        assert_eq!(split.shares.len(), 1);
        assert!(split.withheld.is_empty());
    }

    #[test]
    fn test_rejects_negative_amount() {
        assert!(matches!(
            split_recognition("content-1", &[], -1.0),
            Err(CanopyError::Validation(_))
        ));
        assert!(split_recognition("content-1", &[], f64::NAN).is_err());
    }
}
