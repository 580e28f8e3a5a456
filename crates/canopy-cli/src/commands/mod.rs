// crates/canopy-cli/src/commands/mod.rs
//
// Command module declarations and shared fixture loading for the Canopy CLI.

pub mod access;
pub mod compose;
pub mod stewardship;
pub mod trust;

use std::fs;

use serde::de::DeserializeOwned;

use canopy_engine::{EngineConfig, EngineStores, GovernanceEngine};
use canopy_feedback::DefaultTemplateCatalog;
use canopy_store::{StoreSnapshot, Stores};

use crate::output::OutputFormat;

/// Settings shared by every command.
pub struct Context {
    pub config: EngineConfig,
    pub format: OutputFormat,
}

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path).map_err(|e| format!("Could not read {}: {}", path, e))?;
    let value = serde_json::from_str(&contents).map_err(|e| format!("Could not parse {}: {}", path, e))?;
    Ok(value)
}

/// Seed in-memory stores from a snapshot fixture.
pub fn load_stores(path: &str) -> Result<Stores, Box<dyn std::error::Error>> {
    let snapshot: StoreSnapshot = read_json(path)?;
    Ok(snapshot.into_stores()?)
}

/// Build an engine over `stores`.
pub fn engine<'a>(
    ctx: &Context,
    stores: &'a Stores,
    templates: &'a DefaultTemplateCatalog,
) -> GovernanceEngine<'a> {
    GovernanceEngine::new(
        ctx.config.clone(),
        EngineStores {
            attestations: &stores.attestations,
            allocations: &stores.allocations,
            profiles: &stores.profiles,
            templates,
            credentials: &stores.credentials,
        },
    )
}
