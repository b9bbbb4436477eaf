//! Validation of raw descriptions: JSON schema plus extracted-file presence.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde_json::Value;
use sysdesc_core::errors::{ExError, ExErrorKind};
use sysdesc_core::migrate::DocumentValidator;
use sysdesc_core::scope::all_scopes;

use crate::errors::Result;
use crate::file_store::scoped_path;

const SCHEMA_V3: &str = include_str!("../schemas/v3.json");

/// Validator for descriptions in the current format
pub struct DescriptionValidator {
    validator: jsonschema::Validator,
}

impl DescriptionValidator {
    /// Validator for the bundled current-format schema.
    ///
    /// # Errors
    ///
    /// `Internal` if the bundled schema does not compile.
    pub fn new() -> Result<Self> {
        let schema: Value = serde_json::from_str(SCHEMA_V3).map_err(|e| {
            ExError::new(ExErrorKind::Internal)
                .with_op("load_schema")
                .with_message(e.to_string())
        })?;
        Self::with_schema(&schema)
    }

    /// # Errors
    ///
    /// `Internal` if `schema` is not a valid JSON schema.
    pub fn with_schema(schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema).map_err(|e| {
            ExError::new(ExErrorKind::Internal)
                .with_op("load_schema")
                .with_message(format!("Invalid schema: {}", e))
        })?;
        Ok(Self { validator })
    }

    pub fn validate_schema(&self, doc: &Value) -> Vec<String> {
        self.validator
            .iter_errors(doc)
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect()
    }
}

impl DocumentValidator for DescriptionValidator {
    fn validate(&self, doc: &Value, path: &Path) -> Vec<String> {
        let mut errors = self.validate_schema(doc);
        errors.extend(validate_files(doc, path));
        errors
    }
}

/// Compare the extracted scopes of `doc` against the files below `path`.
///
/// Every listed plain file must exist, and every file on disk must belong to
/// a listed element. Both the `_attributes`/`_elements` body and the
/// `extracted`/`files` body are understood.
pub fn validate_files(doc: &Value, path: &Path) -> Vec<String> {
    let mut errors = Vec::new();
    for def in all_scopes().iter().filter(|def| def.extractable) {
        let Some(body) = doc.get(def.name) else {
            continue;
        };
        let extracted = body
            .pointer("/_attributes/extracted")
            .or_else(|| body.get("extracted"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !extracted {
            continue;
        }
        let elements = body
            .get("_elements")
            .or_else(|| body.get("files"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let scope_dir = path.join(def.name);
        let mut listed = BTreeSet::new();
        for element in elements {
            let Some(name) = element.get("name").and_then(Value::as_str) else {
                continue;
            };
            listed.insert(name.trim_end_matches('/').to_string());
            if !expects_content(element) {
                continue;
            }
            match scoped_path(&scope_dir, name) {
                Ok(file) if file.is_file() => {}
                Ok(_) => errors.push(format!(
                    "{}: extracted file '{}' is missing",
                    def.name, name
                )),
                Err(e) => errors.push(format!("{}: {}", def.name, e.message())),
            }
        }

        let mut on_disk = Vec::new();
        collect_files(&scope_dir, "", &mut on_disk);
        for file in on_disk {
            if !is_covered(&file, &listed) {
                errors.push(format!(
                    "{}: file '{}' is not part of the description",
                    def.name, file
                ));
            }
        }
    }
    errors
}

/// Plain files that still exist on the inspected system
fn expects_content(element: &Value) -> bool {
    let file_type = element.get("type").and_then(Value::as_str).unwrap_or("file");
    let deleted = element
        .get("changes")
        .and_then(Value::as_array)
        .is_some_and(|changes| changes.iter().any(|c| c == "deleted"));
    file_type == "file" && !deleted
}

fn is_covered(file: &str, listed: &BTreeSet<String>) -> bool {
    let mut candidate = file;
    loop {
        if listed.contains(candidate) {
            return true;
        }
        match candidate.rfind('/') {
            Some(0) | None => return false,
            Some(idx) => candidate = &candidate[..idx],
        }
    }
}

/// Files below `dir` as absolute element paths (`/etc/hosts`)
fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let element_path = format!("{}/{}", prefix, name);
        match entry.file_type() {
            Ok(t) if t.is_dir() => collect_files(&entry.path(), &element_path, out),
            Ok(_) => out.push(element_path),
            Err(_) => {}
        }
    }
}
