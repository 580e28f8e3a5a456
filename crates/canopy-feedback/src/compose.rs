// crates/canopy-feedback/src/compose.rs
//
// Path composition: the feedback view of a sequence of content items.
//
// Most restrictive wins. The composed permitted set is the intersection of
// every permitted set, minus anything prohibited by any profile. The merge is
// associative and commutative, so path order never changes the result.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use canopy_core::{min_friction, FeedbackMechanism, FeedbackProfile, FrictionTier};

/// Feedback view over several profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedFeedbackProfile {
    pub permitted_mechanisms: BTreeSet<FeedbackMechanism>,
    pub prohibited_mechanisms: BTreeSet<FeedbackMechanism>,
    /// Content ids of the composed profiles. Empty for the strict default.
    pub content_ids: BTreeSet<String>,
}

impl ComposedFeedbackProfile {
    /// View of a single profile.
    pub fn from_profile(profile: &FeedbackProfile) -> Self {
        Self {
            permitted_mechanisms: profile
                .permitted_mechanisms
                .difference(&profile.prohibited_mechanisms)
                .copied()
                .collect(),
            prohibited_mechanisms: profile.prohibited_mechanisms.clone(),
            content_ids: BTreeSet::from([profile.content_id.clone()]),
        }
    }

    /// View-only, nothing composed.
    pub fn strict_default() -> Self {
        Self {
            permitted_mechanisms: BTreeSet::from([FeedbackMechanism::ViewOnly]),
            prohibited_mechanisms: BTreeSet::new(),
            content_ids: BTreeSet::new(),
        }
    }

    /// Combine two views, most restrictive wins.
    pub fn merge(&self, other: &Self) -> Self {
        let prohibited: BTreeSet<FeedbackMechanism> = self
            .prohibited_mechanisms
            .union(&other.prohibited_mechanisms)
            .copied()
            .collect();
        let permitted = self
            .permitted_mechanisms
            .intersection(&other.permitted_mechanisms)
            .filter(|m| !prohibited.contains(*m))
            .copied()
            .collect();
        Self {
            permitted_mechanisms: permitted,
            prohibited_mechanisms: prohibited,
            content_ids: self.content_ids.union(&other.content_ids).cloned().collect(),
        }
    }

    pub fn permits(&self, mechanism: FeedbackMechanism) -> bool {
        self.permitted_mechanisms.contains(&mechanism)
    }

    pub fn min_friction(&self) -> FrictionTier {
        min_friction(&self.permitted_mechanisms)
    }
}

/// Compose the profiles of a path. An empty path yields the strict default.
pub fn compose_for_path(profiles: &[FeedbackProfile]) -> ComposedFeedbackProfile {
    let mut views = profiles.iter().map(ComposedFeedbackProfile::from_profile);
    let Some(first) = views.next() else {
        return ComposedFeedbackProfile::strict_default();
    };
    let composed = views.fold(first, |acc, view| acc.merge(&view));
    tracing::debug!(
        profiles = profiles.len(),
        permitted = composed.permitted_mechanisms.len(),
        "Composed path feedback profile"
    );
    composed
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_mechanisms() -> impl Strategy<Value = BTreeSet<FeedbackMechanism>> {
        prop::collection::btree_set(prop::sample::select(FeedbackMechanism::ALL.to_vec()), 0..6)
    }

    fn arb_profile() -> impl Strategy<Value = FeedbackProfile> {
        ("[a-e]", arb_mechanisms(), arb_mechanisms()).prop_map(|(id, permitted, prohibited)| FeedbackProfile {
            permitted_mechanisms: permitted,
            prohibited_mechanisms: prohibited,
            ..FeedbackProfile::strict_default(&id)
        })
    }

    proptest! {
        #[test]
        fn composition_is_commutative(profiles in prop::collection::vec(arb_profile(), 0..6), seed in any::<u64>()) {
            let forward = compose_for_path(&profiles);
            let mut shuffled = profiles.clone();
            shuffled.reverse();
            if !shuffled.is_empty() {
                let k = (seed as usize) % shuffled.len();
                shuffled.rotate_left(k);
            }
            prop_assert_eq!(forward, compose_for_path(&shuffled));
        }

        #[test]
        fn composition_is_associative(a in arb_profile(), b in arb_profile(), c in arb_profile()) {
            let (a, b, c) = (
                ComposedFeedbackProfile::from_profile(&a),
                ComposedFeedbackProfile::from_profile(&b),
                ComposedFeedbackProfile::from_profile(&c),
            );
            prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
        }

        #[test]
        fn nothing_prohibited_is_permitted(profiles in prop::collection::vec(arb_profile(), 1..6)) {
            let composed = compose_for_path(&profiles);
            prop_assert!(composed.permitted_mechanisms.is_disjoint(&composed.prohibited_mechanisms));
            for profile in &profiles {
                prop_assert!(composed.permitted_mechanisms.is_subset(&profile.permitted_mechanisms));
            }
        }
    }
}
