pub mod compare;
pub mod list;
pub mod upgrade;
pub mod validate;

use serde_json::Value;

/// Pretty-print a JSON result on stdout
pub fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
