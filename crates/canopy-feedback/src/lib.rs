// crates/canopy-feedback/src/lib.rs
//
// canopy-feedback: Feedback profile resolution for the Canopy governance engine.
//
// A feedback profile lists the engagement mechanisms currently permitted on a
// content item. Profiles start from a sensitivity-category template, change
// only by appending upgrade/downgrade entries to their history, and compose
// across a learning path with a most-restrictive-wins rule.

pub mod compose;
pub mod registry;
pub mod templates;

pub use compose::{compose_for_path, ComposedFeedbackProfile};
pub use registry::{classify_change, FeedbackRegistry};
pub use templates::{default_templates, DefaultTemplateCatalog};
