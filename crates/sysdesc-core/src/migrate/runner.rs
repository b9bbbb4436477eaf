//! Transactional format upgrade of stored descriptions.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{ExError, ExErrorKind, SysDescError};
use crate::migrate::registry::MigrationRegistry;
use crate::{log_op_end, log_op_error, log_op_start};

const STAGING_SUFFIX: &str = ".migration";
const BACKUP_SUFFIX: &str = ".backup";

/// Raw access to stored descriptions by name
pub trait DescriptionRepository {
    /// # Errors
    ///
    /// `NotFound` if there is no such description, `Io`/`Serialization` on
    /// read failures.
    fn load_raw(&self, name: &str) -> Result<Value, ExError>;

    /// # Errors
    ///
    /// `Io` on write failures.
    fn write_raw(&self, name: &str, doc: &Value) -> Result<(), ExError>;

    /// Directory holding the description and its extracted files
    fn description_path(&self, name: &str) -> PathBuf;

    fn exists(&self, name: &str) -> bool;

    /// Copy a description including its extracted files.
    ///
    /// # Errors
    ///
    /// `Io` on failure.
    fn copy_description(&self, from: &str, to: &str) -> Result<(), ExError>;

    /// # Errors
    ///
    /// `Io` on failure.
    fn rename_description(&self, from: &str, to: &str) -> Result<(), ExError>;

    /// # Errors
    ///
    /// `Io` on failure.
    fn remove_description(&self, name: &str) -> Result<(), ExError>;

    /// Names of all stored descriptions
    ///
    /// # Errors
    ///
    /// `Io` if the store cannot be listed.
    fn list(&self) -> Result<Vec<String>, ExError>;
}

/// Checks a raw document; an empty list means valid
pub trait DocumentValidator {
    fn validate(&self, doc: &Value, path: &Path) -> Vec<String>;
}

/// Collaborators and target version for an upgrade run
pub struct MigrationContext<'a> {
    pub repository: &'a dyn DescriptionRepository,
    pub registry: &'a MigrationRegistry,
    pub validator: &'a dyn DocumentValidator,
    pub current_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Already at the current version; nothing was touched
    UpToDate { version: u32 },
    /// Newer than the current version, or a version that is not an
    /// integer (`None`); nothing was touched
    Unsupported { version: Option<u32> },
    Migrated {
        from: u32,
        to: u32,
        /// Descriptions of the steps that ran, in order
        applied: Vec<String>,
        /// Validation errors accepted under `force`
        warnings: Vec<String>,
        /// Retained copy of the pre-upgrade description, set only when
        /// warnings were accepted
        backup: Option<String>,
    },
}

/// Name of the working copy an upgrade of `name` runs on
pub fn staging_name(name: &str) -> String {
    format!("{}{}", name, STAGING_SUFFIX)
}

/// Whether `name` is a staging copy or a retained backup
pub fn is_transient_name(name: &str) -> bool {
    if name.ends_with(STAGING_SUFFIX) {
        return true;
    }
    match name.rsplit_once(BACKUP_SUFFIX) {
        Some((base, rest)) if !base.is_empty() => {
            rest.is_empty()
                || rest
                    .strip_prefix('.')
                    .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        }
        _ => false,
    }
}

fn backup_name(repository: &dyn DescriptionRepository, name: &str) -> String {
    let base = format!("{}{}", name, BACKUP_SUFFIX);
    if !repository.exists(&base) {
        return base;
    }
    (1u32..)
        .map(|n| format!("{}.{}", base, n))
        .find(|candidate| !repository.exists(candidate))
        .unwrap_or(base)
}

fn declared_version(doc: &Value) -> Option<&Value> {
    doc.get("meta").and_then(|meta| meta.get("format_version"))
}

/// Upgrade stored description `name` to the context's current version.
///
/// The steps run on a staging copy. The original is only replaced once the
/// upgraded document has been written and validated, so a failed attempt
/// leaves it byte-identical.
///
/// # Errors
///
/// - `InvalidInput`: `name` is a staging copy or a backup
/// - `NotUpgradable`: the document declares no format version
/// - `MigrationMissing` / `InvalidMigration`: the step chain is incomplete;
///   raised before any file is touched
/// - `ValidationFailed`: the result does not validate and `force` is unset;
///   carries every validation error
/// - any error raised by a step or the repository
pub fn migrate_description(
    ctx: &MigrationContext<'_>,
    name: &str,
    force: bool,
) -> Result<MigrationOutcome, ExError> {
    let start = Instant::now();
    log_op_start!("migrate_description", description = name, force = force);

    let result = run_migration(ctx, name, force);
    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(outcome) => log_op_end!(
            "migrate_description",
            duration_ms = duration_ms,
            description = name,
            outcome = ?outcome
        ),
        Err(err) => log_op_error!(
            "migrate_description",
            err.clone(),
            duration_ms = duration_ms,
            description = name
        ),
    }
    result
}

fn run_migration(
    ctx: &MigrationContext<'_>,
    name: &str,
    force: bool,
) -> Result<MigrationOutcome, ExError> {
    if is_transient_name(name) {
        return Err(ExError::new(ExErrorKind::InvalidInput)
            .with_op("migrate_description")
            .with_entity_id(name)
            .with_message("staging copies and backups are not upgraded"));
    }
    let doc = ctx.repository.load_raw(name)?;
    let version = match declared_version(&doc) {
        None => {
            return Err(ExError::from(SysDescError::NotUpgradable {
                name: name.to_string(),
            })
            .with_op("migrate_description"))
        }
        Some(raw) => match raw.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(version) => version,
            None => {
                warn!(
                    description = name,
                    format_version = %raw,
                    "unrecognized format version, skipping"
                );
                return Ok(MigrationOutcome::Unsupported { version: None });
            }
        },
    };

    if version == ctx.current_version {
        return Ok(MigrationOutcome::UpToDate { version });
    }
    if version > ctx.current_version {
        return Ok(MigrationOutcome::Unsupported {
            version: Some(version),
        });
    }

    let plan = ctx.registry.plan(version, ctx.current_version)?;
    let applied: Vec<String> = plan.iter().map(|(_, step)| step.desc().to_string()).collect();

    let staging = staging_name(name);
    if ctx.repository.exists(&staging) {
        ctx.repository.remove_description(&staging)?;
    }
    ctx.repository.copy_description(name, &staging)?;

    let staged = (|| {
        let path = ctx.repository.description_path(&staging);
        let mut doc = doc;
        for (from, step) in &plan {
            debug!(
                description = name,
                from = *from,
                step = step.desc(),
                "applying migration"
            );
            step.migrate(&mut doc, &path)?;
        }
        set_format_version(&mut doc, ctx.current_version)?;
        ctx.repository.write_raw(&staging, &doc)?;
        Ok::<_, ExError>(ctx.validator.validate(&doc, &path))
    })();

    let errors = match staged {
        Ok(errors) => errors,
        Err(err) => {
            discard(ctx.repository, &staging);
            return Err(err);
        }
    };
    if !errors.is_empty() && !force {
        discard(ctx.repository, &staging);
        return Err(ExError::new(ExErrorKind::ValidationFailed)
            .with_op("migrate_description")
            .with_entity_id(name)
            .with_message(format!(
                "upgraded description does not validate ({} errors); use force to keep it",
                errors.len()
            ))
            .with_errors(errors));
    }

    let backup = commit(ctx.repository, name, &staging)?;
    let backup = if errors.is_empty() {
        ctx.repository.remove_description(&backup)?;
        None
    } else {
        for error in &errors {
            warn!(description = name, error = %error, "accepted validation error");
        }
        Some(backup)
    };

    Ok(MigrationOutcome::Migrated {
        from: version,
        to: ctx.current_version,
        applied,
        warnings: errors,
        backup,
    })
}

fn set_format_version(doc: &mut Value, version: u32) -> Result<(), ExError> {
    let Value::Object(top) = doc else {
        return Err(ExError::new(ExErrorKind::MalformedDocument)
            .with_op("migrate_description")
            .with_message("description is not an object"));
    };
    let meta = top
        .entry("meta")
        .or_insert_with(|| Value::Object(Default::default()));
    let Value::Object(meta) = meta else {
        return Err(ExError::new(ExErrorKind::MalformedDocument)
            .with_op("migrate_description")
            .with_message("meta is not an object"));
    };
    meta.insert("format_version".to_string(), Value::from(version));
    Ok(())
}

/// Swap the staging copy into place, returning where the original went
fn commit(
    repository: &dyn DescriptionRepository,
    name: &str,
    staging: &str,
) -> Result<String, ExError> {
    let backup = backup_name(repository, name);
    repository.rename_description(name, &backup)?;
    if let Err(err) = repository.rename_description(staging, name) {
        if let Err(restore) = repository.rename_description(&backup, name) {
            warn!(
                description = name,
                backup = %backup,
                error = %restore,
                "could not restore original"
            );
        }
        discard(repository, staging);
        return Err(err);
    }
    Ok(backup)
}

fn discard(repository: &dyn DescriptionRepository, staging: &str) {
    if let Err(err) = repository.remove_description(staging) {
        warn!(staging = staging, error = %err, "could not remove staging copy");
    }
}

/// Upgrade every stored description, skipping staging copies and backups.
///
/// Failures are reported per description and do not stop the run.
///
/// # Errors
///
/// Only if the repository cannot be listed.
pub fn upgrade_all(
    ctx: &MigrationContext<'_>,
    force: bool,
) -> Result<Vec<(String, Result<MigrationOutcome, ExError>)>, ExError> {
    let names = ctx.repository.list()?;
    Ok(names
        .into_iter()
        .filter(|name| !is_transient_name(name))
        .map(|name| {
            let outcome = migrate_description(ctx, &name, force);
            (name, outcome)
        })
        .collect())
}
