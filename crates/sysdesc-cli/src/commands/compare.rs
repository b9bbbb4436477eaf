//! Compare command
//!
//! Usage: sysdesc compare <NAME1> <NAME2> [--scope <SCOPE>]...

use clap::Args;
use serde_json::{json, Value};
use sysdesc_core::scope::internal_name;
use sysdesc_core::{compare_descriptions, ExError};
use sysdesc_store::DescriptionStore;

use super::print_json;

#[derive(Debug, Args)]
pub struct CompareArgs {
    pub name1: String,
    pub name2: String,

    /// Only compare this scope (e.g. `changed-config-files`); repeatable.
    /// All scopes present on either side by default.
    #[arg(long = "scope", value_name = "SCOPE")]
    pub scopes: Vec<String>,
}

/// Execute compare command
pub fn execute(
    store: &DescriptionStore,
    args: CompareArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let desc1 = store.load(&args.name1)?;
    let desc2 = store.load(&args.name2)?;

    let scopes: Vec<String> = args.scopes.iter().map(|s| internal_name(s)).collect();
    let scopes: Vec<&str> = scopes.iter().map(String::as_str).collect();
    let comparisons = compare_descriptions(&desc1, &desc2, &scopes).map_err(ExError::from)?;

    let identical = comparisons.iter().all(|c| c.is_identical());
    let comparisons: Vec<Value> = comparisons.iter().map(|c| c.to_raw()).collect();
    print_json(&json!({
        "name1": args.name1,
        "name2": args.name2,
        "identical": identical,
        "comparisons": comparisons,
    }))
}
