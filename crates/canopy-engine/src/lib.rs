// crates/canopy-engine/src/lib.rs
//
// canopy-engine: Top-level facade for the Canopy governance engine.
//
// Composes the reach resolver, access evaluator, stewardship ledger, and
// feedback registry over repositories borrowed from the caller. The engine
// owns no records; it reads and appends through the stores it was given.

pub mod config;
pub mod engine;

pub use config::{EngineConfig, TrustConfig};
pub use engine::{EngineStores, GovernanceEngine};
