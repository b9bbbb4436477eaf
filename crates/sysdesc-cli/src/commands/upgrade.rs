//! Format upgrade command
//!
//! Usage: sysdesc upgrade-format (<NAME> | --all) [--force]

use clap::Args;
use serde_json::{json, Value};
use sysdesc_core::migrate::{migrate_description, upgrade_all, MigrationContext, MigrationOutcome};
use sysdesc_core::ExError;
use sysdesc_store::{default_registry, DescriptionStore, DescriptionValidator};

use super::print_json;

#[derive(Debug, Args)]
pub struct UpgradeArgs {
    /// Description to upgrade
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub name: Option<String>,

    /// Upgrade every stored description
    #[arg(long)]
    pub all: bool,

    /// Keep the upgrade even if it does not validate; the original is
    /// retained as a backup
    #[arg(long)]
    pub force: bool,
}

/// Execute upgrade-format command
pub fn execute(
    store: &DescriptionStore,
    args: UpgradeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = default_registry();
    let validator = DescriptionValidator::new()?;
    let ctx = MigrationContext {
        repository: store,
        registry: &registry,
        validator: &validator,
        current_version: store.current_version(),
    };

    match args.name {
        Some(name) if !args.all => {
            let outcome = migrate_description(&ctx, &name, args.force)?;
            print_json(&outcome_json(&name, &outcome))
        }
        _ => {
            let results = upgrade_all(&ctx, args.force)?;
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            let report: Vec<Value> = results
                .iter()
                .map(|(name, result)| match result {
                    Ok(outcome) => outcome_json(name, outcome),
                    Err(err) => error_json(name, err),
                })
                .collect();
            print_json(&Value::Array(report))?;
            if failed > 0 {
                return Err(format!("{} description(s) failed to upgrade", failed).into());
            }
            Ok(())
        }
    }
}

fn outcome_json(name: &str, outcome: &MigrationOutcome) -> Value {
    match outcome {
        MigrationOutcome::UpToDate { version } => json!({
            "name": name,
            "status": "up_to_date",
            "format_version": version,
        }),
        MigrationOutcome::Unsupported { version } => json!({
            "name": name,
            "status": "unsupported",
            "format_version": version,
        }),
        MigrationOutcome::Migrated {
            from,
            to,
            applied,
            warnings,
            backup,
        } => json!({
            "name": name,
            "status": "migrated",
            "from": from,
            "to": to,
            "applied": applied,
            "warnings": warnings,
            "backup": backup,
        }),
    }
}

fn error_json(name: &str, err: &ExError) -> Value {
    json!({
        "name": name,
        "status": "failed",
        "error": err.code(),
        "message": err.message(),
        "errors": err.errors(),
    })
}
