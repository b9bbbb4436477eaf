//! Format migrations of stored descriptions
//!
//! One step per format version, registered under the version it upgrades
//! from.

mod v1_to_v2;
mod v2_to_v3;

pub use v1_to_v2::RenameConfigFiles;
pub use v2_to_v3::WrapScopeBodies;

use sysdesc_core::migrate::MigrationRegistry;

/// Registry holding every step up to the current format
pub fn default_registry() -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    registry.register(1, Box::new(RenameConfigFiles));
    registry.register(2, Box::new(WrapScopeBodies));
    registry
}
