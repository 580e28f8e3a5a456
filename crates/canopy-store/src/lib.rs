// crates/canopy-store/src/lib.rs
//
// canopy-store: In-memory repositories for the Canopy governance engine.
//
// Each store implements one of the `canopy-core` repository traits behind a
// `RwLock`. Stores are plain values: create one per request, test case, or
// CLI invocation and pass it to the resolvers by reference. Nothing here is a
// process-wide singleton. A `StoreSnapshot` seeds a set of stores from JSON.

pub mod allocations;
pub mod attestations;
pub mod credentials;
pub mod profiles;
pub mod snapshot;

pub use allocations::InMemoryAllocationStore;
pub use attestations::InMemoryAttestationStore;
pub use credentials::InMemoryCredentialDirectory;
pub use profiles::InMemoryProfileStore;
pub use snapshot::{StoreSnapshot, Stores};

use canopy_core::CanopyError;

pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> CanopyError {
    CanopyError::Storage(format!("RwLock poisoned: {}", e))
}
