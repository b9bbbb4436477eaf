//! Ordered single-step format migrations.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::errors::{ExError, ExErrorKind};

/// Transforms a raw document from format version `n` to `n + 1`.
pub trait Migration {
    /// Human-readable summary; an empty description marks the step invalid
    fn desc(&self) -> &str;

    /// Mutate `doc` in place.
    ///
    /// `path` is the on-disk location of the description being migrated, for
    /// steps that also move extracted files.
    ///
    /// # Errors
    ///
    /// Whatever the step fails with; the pipeline discards its work.
    fn migrate(&self, doc: &mut Value, path: &Path) -> Result<(), ExError>;
}

/// Migration steps keyed by the version they upgrade from
#[derive(Default)]
pub struct MigrationRegistry {
    steps: BTreeMap<u32, Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the step that upgrades documents at `from_version`.
    ///
    /// A later registration for the same version replaces the earlier one.
    pub fn register(&mut self, from_version: u32, migration: Box<dyn Migration>) {
        self.steps.insert(from_version, migration);
    }

    pub fn get(&self, from_version: u32) -> Option<&dyn Migration> {
        self.steps.get(&from_version).map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps `from..to` in ascending order.
    ///
    /// # Errors
    ///
    /// `MigrationMissing` for a gap in the chain, `InvalidMigration` for a
    /// step without a description. Both are detected before any step runs.
    pub fn plan(&self, from: u32, to: u32) -> Result<Vec<(u32, &dyn Migration)>, ExError> {
        (from..to)
            .map(|version| {
                let step = self.get(version).ok_or_else(|| {
                    ExError::new(ExErrorKind::MigrationMissing)
                        .with_op("plan_migrations")
                        .with_message(format!(
                            "no migration registered from format version {} to {}",
                            version,
                            version + 1
                        ))
                })?;
                if step.desc().trim().is_empty() {
                    return Err(ExError::new(ExErrorKind::InvalidMigration)
                        .with_op("plan_migrations")
                        .with_message(format!(
                            "migration from format version {} has no description",
                            version
                        )));
                }
                Ok((version, step))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Step(&'static str);

    impl Migration for Step {
        fn desc(&self) -> &str {
            self.0
        }

        fn migrate(&self, _doc: &mut Value, _path: &Path) -> Result<(), ExError> {
            Ok(())
        }
    }

    #[test]
    fn test_plan_is_ascending_and_minimal() {
        let mut registry = MigrationRegistry::new();
        registry.register(3, Box::new(Step("three")));
        registry.register(1, Box::new(Step("one")));
        registry.register(2, Box::new(Step("two")));

        let plan = registry.plan(2, 4).unwrap();
        let versions: Vec<u32> = plan.iter().map(|(v, _)| *v).collect();
        assert_eq!(versions, vec![2, 3]);
        assert!(registry.plan(4, 4).unwrap().is_empty());
    }

    #[test]
    fn test_plan_rejects_gaps_and_blank_descriptions() {
        let mut registry = MigrationRegistry::new();
        registry.register(1, Box::new(Step("one")));
        let err = registry.plan(1, 3).err().unwrap();
        assert_eq!(err.kind(), ExErrorKind::MigrationMissing);

        registry.register(2, Box::new(Step("  ")));
        let err = registry.plan(1, 3).err().unwrap();
        assert_eq!(err.kind(), ExErrorKind::InvalidMigration);
    }
}
