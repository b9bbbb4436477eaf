//! sysdesc core - in-memory model of system descriptions
//!
//! This crate provides:
//! - The polymorphic [`Node`] document tree with JSON round-trip
//! - Typed inventory records and the static scope registry
//! - [`SystemDescription`] with format-version gating
//! - Four-way scope comparison
//! - Path-based exclusion filters
//! - The transactional format migration pipeline
//!
//! Nothing here touches the file system directly; storage is injected
//! through the [`file_store::FileStore`] and
//! [`migrate::DescriptionRepository`] traits.

pub mod compare;
pub mod config;
pub mod description;
pub mod errors;
pub mod file_store;
pub mod filter;
pub mod logging_facility;
pub mod migrate;
pub mod model;
pub mod node;
pub mod scope;

// Used by the logging macros
pub use sysdesc_core_types;

pub use compare::{compare_descriptions, compare_scope, Comparison, Side};
pub use config::Config;
pub use description::{FormatStatus, SystemDescription, CURRENT_FORMAT_VERSION};
pub use errors::{ExError, ExErrorKind, Result, SysDescError};
pub use filter::{ElementFilter, Filter};
pub use model::{Element, ElementKind};
pub use node::{Mapping, Node, Sequence};
pub use scope::{Scope, ScopeBuilder};
