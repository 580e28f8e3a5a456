// crates/canopy-access/src/requirement.rs
//
// Access requirement attached to a content item.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use canopy_core::{AccessLevel, RequirementMode};

/// Agent attestations a requester must hold, with explicit composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RequiredAttestations {
    #[serde(default)]
    pub mode: RequirementMode,
    #[serde(default)]
    pub ids: BTreeSet<String>,
}

impl RequiredAttestations {
    pub fn all_of<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: RequirementMode::AllOf,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn any_of<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: RequirementMode::AnyOf,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Ids the requester still needs, given what they hold.
    ///
    /// For `all-of` this is the set difference. For `any-of` it is empty as
    /// soon as one id is held, otherwise every listed id.
    pub fn missing_from(&self, held: &BTreeSet<String>) -> Vec<String> {
        match self.mode {
            RequirementMode::AllOf => self.ids.difference(held).cloned().collect(),
            RequirementMode::AnyOf => {
                if self.ids.is_empty() || self.ids.iter().any(|id| held.contains(id)) {
                    Vec::new()
                } else {
                    self.ids.iter().cloned().collect()
                }
            }
        }
    }
}

/// What a requester must present to access a content item.
///
/// Every field defaults to the most permissive value, so `{}` admits any
/// visitor. Strictness comes from the requirement, never from its absence
/// on the requester side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequirement {
    #[serde(default)]
    pub min_level: AccessLevel,
    #[serde(default)]
    pub required_attestations: RequiredAttestations,
    /// Learning paths that must be completed, in suggested order.
    #[serde(default)]
    pub required_paths: Vec<String>,
    #[serde(default)]
    pub requires_governance_approval: bool,
    #[serde(default)]
    pub requires_age_verification: bool,
}

impl AccessRequirement {
    /// A requirement that only checks the authentication level.
    pub fn at_level(min_level: AccessLevel) -> Self {
        Self {
            min_level,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_of_lists_each_missing_id() {
        let req = RequiredAttestations::all_of(["steward", "mentor", "elder"]);
        assert_eq!(
            req.missing_from(&held(&["mentor"])),
            vec!["elder".to_string(), "steward".to_string()]
        );
        assert!(req.missing_from(&held(&["steward", "mentor", "elder"])).is_empty());
    }

    #[test]
    fn test_any_of_satisfied_by_one() {
        let req = RequiredAttestations::any_of(["steward", "mentor"]);
        assert!(req.missing_from(&held(&["mentor"])).is_empty());
        assert_eq!(req.missing_from(&held(&[])).len(), 2);
        assert!(RequiredAttestations::any_of(Vec::<String>::new())
            .missing_from(&held(&[]))
            .is_empty());
    }

    #[test]
    fn test_requirement_json_defaults() {
        let req: AccessRequirement = serde_json::from_str(r#"{"minLevel":"member"}"#).unwrap();
        assert_eq!(req, AccessRequirement::at_level(AccessLevel::Member));

        let req: AccessRequirement = serde_json::from_str(
            r#"{"requiredAttestations":{"mode":"any-of","ids":["a","b"]},"requiredPaths":["p1"]}"#,
        )
        .unwrap();
        assert_eq!(req.required_attestations.mode, RequirementMode::AnyOf);
        assert_eq!(req.required_paths, vec!["p1".to_string()]);
    }
}
