// crates/canopy-core/src/extension.rs
//
// Typed extension map attached to attestations, allocations, and profiles.
//
// The core schema of each record is closed. Anything beyond it goes into an
// `Extensions` map whose values are a small tagged union, so records stay
// serializable without admitting arbitrary JSON shapes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single extension value.
///
/// Serialized as `{"type": "text", "value": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum ExtensionValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Timestamp(DateTime<Utc>),
    List(Vec<ExtensionValue>),
}

/// Ordered map of extension fields keyed by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(BTreeMap<String, ExtensionValue>);

impl Extensions {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a value, returning the previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: ExtensionValue) -> Option<ExtensionValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&ExtensionValue> {
        self.0.get(key)
    }

    /// Convenience accessor for text values.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(ExtensionValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtensionValue)> {
        self.0.iter()
    }
}
