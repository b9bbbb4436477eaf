//! Format migration pipeline.
//!
//! Stored descriptions carry `meta.format_version`. Upgrading one applies
//! exactly the registered steps between its version and the current one,
//! each once, in ascending order, on the raw untyped document.
//!
//! Storage and validation are injected through [`DescriptionRepository`] and
//! [`DocumentValidator`]; the concrete steps live with the store.

mod registry;
mod runner;

pub use registry::{Migration, MigrationRegistry};
pub use runner::{
    is_transient_name, migrate_description, staging_name, upgrade_all, DescriptionRepository,
    DocumentValidator, MigrationContext, MigrationOutcome,
};
