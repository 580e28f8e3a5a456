// crates/canopy-core/src/reach.rs
//
// Reach levels: the audience tiers a content item may be discovered by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CanopyError;

/// Discoverability tier of a content item, from narrowest to widest audience.
///
/// The ordering is total: `private < invited < local < community < federated < commons`.
/// Content starts at `private` and only widens as satisfied attestations accumulate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ReachLevel {
    /// Only the author can discover the content.
    #[default]
    Private,
    /// Explicitly invited agents only.
    Invited,
    /// Local cluster or household.
    Local,
    /// A named community.
    Community,
    /// Federated communities.
    Federated,
    /// Open commons, discoverable by anyone.
    Commons,
}

impl ReachLevel {
    /// All levels in ascending order.
    pub const ALL: [ReachLevel; 6] = [
        ReachLevel::Private,
        ReachLevel::Invited,
        ReachLevel::Local,
        ReachLevel::Community,
        ReachLevel::Federated,
        ReachLevel::Commons,
    ];

    /// Convert to the wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Invited => "invited",
            Self::Local => "local",
            Self::Community => "community",
            Self::Federated => "federated",
            Self::Commons => "commons",
        }
    }

    /// Ordinal position, 0 for `private` through 5 for `commons`.
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// The next narrower level, or `None` at `private`.
    pub fn next_lower(&self) -> Option<ReachLevel> {
        match self {
            Self::Private => None,
            Self::Invited => Some(Self::Private),
            Self::Local => Some(Self::Invited),
            Self::Community => Some(Self::Local),
            Self::Federated => Some(Self::Community),
            Self::Commons => Some(Self::Federated),
        }
    }

    /// Whether this level reaches beyond a single community.
    pub fn is_wide(&self) -> bool {
        *self >= Self::Federated
    }
}

impl FromStr for ReachLevel {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(Self::Private),
            "invited" => Ok(Self::Invited),
            "local" => Ok(Self::Local),
            "community" => Ok(Self::Community),
            "federated" => Ok(Self::Federated),
            "commons" | "public" => Ok(Self::Commons),
            other => Err(CanopyError::Validation(format!("Unknown reach level: {}", other))),
        }
    }
}

impl fmt::Display for ReachLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reach_ordering() {
        assert!(ReachLevel::Private < ReachLevel::Invited);
        assert!(ReachLevel::Invited < ReachLevel::Local);
        assert!(ReachLevel::Local < ReachLevel::Community);
        assert!(ReachLevel::Community < ReachLevel::Federated);
        assert!(ReachLevel::Federated < ReachLevel::Commons);
    }

    #[test]
    fn test_next_lower_terminates_at_private() {
        let mut level = ReachLevel::Commons;
        let mut steps = 0;
        while let Some(lower) = level.next_lower() {
            assert!(lower < level);
            level = lower;
            steps += 1;
        }
        assert_eq!(level, ReachLevel::Private);
        assert_eq!(steps, 5);
    }

    #[test]
    fn test_parse_accepts_public_alias() {
        assert_eq!("public".parse::<ReachLevel>().unwrap(), ReachLevel::Commons);
        assert_eq!("Community".parse::<ReachLevel>().unwrap(), ReachLevel::Community);
        assert!("regional".parse::<ReachLevel>().is_err());
    }

    #[test]
    fn test_wire_strings_round_trip() {
        for level in ReachLevel::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level.as_str()));
            let back: ReachLevel = serde_json::from_str(&json).unwrap();
            assert_eq!(back, level);
        }
    }
}
