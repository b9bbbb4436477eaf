use std::path::Path;

use serde_json::{Map, Value};
use sysdesc_core::errors::ExError;
use sysdesc_core::migrate::Migration;
use sysdesc_core::scope::{scope_def, ScopeShape};

use crate::errors::migration_error;

/// Moves element scopes into the `_attributes`/`_elements` layout
///
/// - `[...]` becomes `{"_elements": [...]}`
/// - `{"extracted": e, "files": [...]}` becomes
///   `{"_attributes": {"extracted": e}, "_elements": [...]}`
///
/// Record scopes and unregistered keys are left alone.
pub struct WrapScopeBodies;

impl Migration for WrapScopeBodies {
    fn desc(&self) -> &str {
        "Wrap scope bodies into `_attributes`/`_elements`"
    }

    fn migrate(&self, doc: &mut Value, _path: &Path) -> Result<(), ExError> {
        let Value::Object(top) = doc else {
            return Err(migration_error(self.desc(), "description is not an object"));
        };
        for (key, body) in top.iter_mut() {
            let is_element_scope = scope_def(key)
                .map(|def| matches!(def.shape, ScopeShape::Elements(_)))
                .unwrap_or(false);
            if is_element_scope {
                *body = wrap(key, body.take())
                    .map_err(|reason| migration_error(self.desc(), &reason))?;
            }
        }

        let meta = top
            .entry("meta")
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(meta) = meta else {
            return Err(migration_error(self.desc(), "meta is not an object"));
        };
        meta.entry("filters")
            .or_insert_with(|| Value::Object(Map::new()));
        Ok(())
    }
}

fn wrap(scope: &str, body: Value) -> Result<Value, String> {
    match body {
        Value::Array(items) => {
            let mut wrapped = Map::new();
            wrapped.insert("_elements".to_string(), Value::Array(items));
            Ok(Value::Object(wrapped))
        }
        Value::Object(mut map) if !map.contains_key("_elements") => {
            let files = map.remove("files").unwrap_or_else(|| Value::Array(Vec::new()));
            if !files.is_array() {
                return Err(format!("scope '{}': files is not an array", scope));
            }
            let mut wrapped = Map::new();
            if !map.is_empty() {
                wrapped.insert("_attributes".to_string(), Value::Object(map));
            }
            wrapped.insert("_elements".to_string(), files);
            Ok(Value::Object(wrapped))
        }
        Value::Object(map) => Ok(Value::Object(map)),
        other => Err(format!("scope '{}': unexpected body {}", scope, other)),
    }
}
