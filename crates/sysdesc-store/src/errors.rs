//! Error handling for sysdesc-store
//!
//! Wraps sysdesc-core ExError with store-specific helpers

use std::path::Path;

use sysdesc_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an IO error naming the path involved
pub fn io_error_at(operation: &str, path: &Path, err: std::io::Error) -> ExError {
    io_error(operation, err).with_entity_id(path.display().to_string())
}

/// Create a missing description error
pub fn description_missing(name: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op("load_description")
        .with_entity_id(name)
        .with_message(format!("System description '{}' does not exist", name))
}

/// Create an invalid description name error
pub fn invalid_name(name: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op("validate_name")
        .with_entity_id(name)
        .with_message(format!("Invalid description name '{}': {}", name, reason))
}

/// Create a manifest parse error
pub fn manifest_error(name: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op("parse_manifest")
        .with_entity_id(name)
        .with_message(err.to_string())
}

/// Create a missing filter file error
pub fn filter_file_missing(path: &Path) -> ExError {
    ExError::new(ExErrorKind::FilterFileMissing)
        .with_op("expand_filter_files")
        .with_entity_id(path.display().to_string())
        .with_message(format!("Filter file '{}' does not exist", path.display()))
}

/// Create a migration step error
pub fn migration_error(step: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::MalformedDocument)
        .with_op("migration")
        .with_message(format!("Migration '{}' failed: {}", step, reason))
}
