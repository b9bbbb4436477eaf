//! Validate command
//!
//! Usage: sysdesc validate <NAME>

use clap::Args;
use serde_json::json;
use sysdesc_core::errors::{ExError, ExErrorKind};
use sysdesc_core::migrate::{DescriptionRepository, DocumentValidator};
use sysdesc_store::{DescriptionStore, DescriptionValidator};

use super::print_json;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    pub name: String,
}

/// Execute validate command
pub fn execute(
    store: &DescriptionStore,
    args: ValidateArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let desc = store.load(&args.name)?;
    desc.ensure_compatible().map_err(ExError::from)?;

    let raw = store.load_raw(&args.name)?;
    let validator = DescriptionValidator::new()?;
    let errors = validator.validate(&raw, &store.description_dir(&args.name));

    print_json(&json!({
        "name": &args.name,
        "valid": errors.is_empty(),
        "errors": &errors,
    }))?;
    if !errors.is_empty() {
        return Err(ExError::new(ExErrorKind::ValidationFailed)
            .with_op("validate")
            .with_entity_id(args.name)
            .with_message(format!("{} validation error(s)", errors.len()))
            .into());
    }
    Ok(())
}
