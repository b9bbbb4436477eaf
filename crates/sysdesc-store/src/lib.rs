//! sysdesc store - on-disk persistence for system descriptions
//!
//! Provides:
//! - A directory-per-description store with atomic manifest writes
//! - Filesystem access to extracted file content
//! - Schema and file-presence validation
//! - The concrete format migrations and their registry
//! - `@file` expansion for filter definitions

pub mod atomic;
pub mod errors;
pub mod file_store;
pub mod filter_file;
pub mod migrations;
pub mod store;
pub mod validation;

pub use errors::Result;
pub use file_store::FsFileStore;
pub use filter_file::{expand_filter_files, load_filter};
pub use migrations::default_registry;
pub use store::DescriptionStore;
pub use validation::DescriptionValidator;
