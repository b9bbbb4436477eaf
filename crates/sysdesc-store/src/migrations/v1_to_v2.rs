use std::fs;
use std::path::Path;

use serde_json::Value;
use sysdesc_core::errors::ExError;
use sysdesc_core::migrate::Migration;

use crate::errors::{io_error_at, migration_error};

const OLD_SCOPE: &str = "config_files";
const NEW_SCOPE: &str = "changed_config_files";

/// Renames the `config_files` scope, its metadata and its extracted files
pub struct RenameConfigFiles;

impl Migration for RenameConfigFiles {
    fn desc(&self) -> &str {
        "Rename scope `config_files` to `changed_config_files`"
    }

    fn migrate(&self, doc: &mut Value, path: &Path) -> Result<(), ExError> {
        let Value::Object(top) = doc else {
            return Err(migration_error(self.desc(), "description is not an object"));
        };
        if top.contains_key(NEW_SCOPE) && top.contains_key(OLD_SCOPE) {
            return Err(migration_error(
                self.desc(),
                "both config_files and changed_config_files are present",
            ));
        }
        if let Some(body) = top.remove(OLD_SCOPE) {
            top.insert(NEW_SCOPE.to_string(), body);
        }
        if let Some(Value::Object(meta)) = top.get_mut("meta") {
            if let Some(scope_meta) = meta.remove(OLD_SCOPE) {
                meta.insert(NEW_SCOPE.to_string(), scope_meta);
            }
        }

        let old_dir = path.join(OLD_SCOPE);
        if old_dir.is_dir() {
            fs::rename(&old_dir, path.join(NEW_SCOPE))
                .map_err(|e| io_error_at("migrate_v1_to_v2", &old_dir, e))?;
        }
        Ok(())
    }
}
