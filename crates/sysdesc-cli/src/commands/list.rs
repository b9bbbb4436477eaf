//! List command
//!
//! Usage: sysdesc list

use serde_json::{json, Value};
use sysdesc_core::migrate::DescriptionRepository;
use sysdesc_core::FormatStatus;
use sysdesc_store::DescriptionStore;

use super::print_json;

/// Execute list command
pub fn execute(store: &DescriptionStore) -> Result<(), Box<dyn std::error::Error>> {
    let entries: Vec<Value> = store
        .list()?
        .iter()
        .map(|name| match store.load(name) {
            Ok(desc) => json!({
                "name": name,
                "format_version": desc.format_version(),
                "status": status_name(desc.format_status()),
            }),
            Err(err) => json!({
                "name": name,
                "status": "unreadable",
                "error": err.code(),
            }),
        })
        .collect();
    print_json(&Value::Array(entries))
}

fn status_name(status: FormatStatus) -> &'static str {
    match status {
        FormatStatus::Current => "current",
        FormatStatus::NeedsUpgrade { .. } => "needs_upgrade",
        FormatStatus::Ahead { .. } => "ahead",
        FormatStatus::Unversioned => "unversioned",
    }
}
