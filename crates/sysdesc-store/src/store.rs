//! Directory-per-description store.
//!
//! ```text
//! <root>/<name>/manifest.json
//! <root>/<name>/<scope>/<element path>
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use sysdesc_core::description::CURRENT_FORMAT_VERSION;
use sysdesc_core::errors::ExError;
use sysdesc_core::migrate::{is_transient_name, DescriptionRepository};
use sysdesc_core::scope::all_scopes;
use sysdesc_core::{log_op_end, log_op_error, log_op_start, Config, SystemDescription};
use tracing::debug;

use crate::atomic::atomic_write;
use crate::errors::{description_missing, invalid_name, io_error_at, manifest_error, Result};
use crate::file_store::FsFileStore;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone)]
pub struct DescriptionStore {
    root: PathBuf,
    current_version: u32,
}

impl DescriptionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            current_version: CURRENT_FORMAT_VERSION,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.store_dir.clone()).with_current_version(config.format_version)
    }

    pub fn with_current_version(mut self, version: u32) -> Self {
        self.current_version = version;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Check a name under which a new description may be saved.
    ///
    /// Names of upgrade staging copies (`<name>.migration`) and backups
    /// (`<name>.backup[.N]`) are reserved.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for empty names, names containing `/`, names starting
    /// with `.` and reserved names.
    pub fn validate_name(name: &str) -> Result<()> {
        check_dir_name(name)?;
        if is_transient_name(name) {
            return Err(invalid_name(
                name,
                "name is reserved for upgrade staging copies and backups",
            ));
        }
        Ok(())
    }

    pub fn description_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.description_dir(name).join(MANIFEST_FILE)
    }

    /// Load and type a stored description.
    ///
    /// Documents at another format version load successfully; their scopes
    /// stay untyped and reading one reports the format status.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a bad name, `NotFound` if there is no such
    /// description, `Serialization`/`MalformedDocument` for unreadable
    /// manifests.
    pub fn load(&self, name: &str) -> Result<SystemDescription> {
        let start = Instant::now();
        log_op_start!("load_description", description = name);

        let result = self.load_raw(name).and_then(|raw| {
            let file_store = Arc::new(FsFileStore::new(self.description_dir(name)));
            SystemDescription::from_raw_versioned(name, &raw, file_store, self.current_version)
                .map_err(|e| with_context(e.into(), "load_description", name))
        });

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(desc) => log_op_end!(
                "load_description",
                duration_ms = duration_ms,
                description = name,
                format_version = ?desc.format_version()
            ),
            Err(err) => log_op_error!(
                "load_description",
                err.clone(),
                duration_ms = duration_ms,
                description = name
            ),
        }
        result
    }

    /// Write the manifest of `desc` under its name.
    ///
    /// An extractable scope that is present but not extracted loses any
    /// previously extracted files.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a bad name, `Io` on write failures.
    pub fn save(&self, desc: &SystemDescription) -> Result<()> {
        let name = desc.name();
        let start = Instant::now();
        log_op_start!("save_description", description = name);

        let result = self.write_description(desc);

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => log_op_end!(
                "save_description",
                duration_ms = duration_ms,
                description = name
            ),
            Err(err) => log_op_error!(
                "save_description",
                err.clone(),
                duration_ms = duration_ms,
                description = name
            ),
        }
        result
    }

    fn write_description(&self, desc: &SystemDescription) -> Result<()> {
        Self::validate_name(desc.name())?;
        self.write_raw(desc.name(), &desc.to_raw())?;

        let dir = self.description_dir(desc.name());
        for def in all_scopes().iter().filter(|def| def.extractable) {
            let Ok(Some(scope)) = desc.scope(def.name) else {
                continue;
            };
            if scope.is_extracted() {
                continue;
            }
            let stale = dir.join(def.name);
            if stale.is_dir() {
                debug!(
                    description = desc.name(),
                    scope = def.name,
                    "removing stale extracted files"
                );
                fs::remove_dir_all(&stale)
                    .map_err(|e| io_error_at("remove_stale_extraction", &stale, e))?;
            }
        }
        Ok(())
    }

    /// Delete a stored description and its extracted files.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a bad name, `NotFound` if it does not exist, `Io`
    /// on failure.
    pub fn remove(&self, name: &str) -> Result<()> {
        check_dir_name(name)?;
        if !self.exists(name) {
            return Err(description_missing(name).with_op("remove_description"));
        }
        self.remove_description(name)
    }
}

/// Names that map to a single directory below the store root
fn check_dir_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid_name(name, "name is empty"));
    }
    if name.contains('/') {
        return Err(invalid_name(name, "name must not contain '/'"));
    }
    if name.starts_with('.') {
        return Err(invalid_name(name, "name must not start with '.'"));
    }
    Ok(())
}

fn with_context(err: ExError, op: &str, name: &str) -> ExError {
    let err = err.with_op(op);
    if err.entity_id().is_none() {
        err.with_entity_id(name)
    } else {
        err
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| io_error_at("copy_description", to, e))?;
    let entries = fs::read_dir(from).map_err(|e| io_error_at("copy_description", from, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_error_at("copy_description", from, e))?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| io_error_at("copy_description", &source, e))?;
        if file_type.is_dir() {
            copy_dir_recursive(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(|e| io_error_at("copy_description", &source, e))?;
        }
    }
    Ok(())
}

impl DescriptionRepository for DescriptionStore {
    fn load_raw(&self, name: &str) -> Result<Value> {
        check_dir_name(name)?;
        let path = self.manifest_path(name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(description_missing(name)),
            Err(e) => return Err(io_error_at("load_description", &path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| manifest_error(name, e))
    }

    fn write_raw(&self, name: &str, doc: &Value) -> Result<()> {
        check_dir_name(name)?;
        let mut bytes = serde_json::to_vec_pretty(doc).map_err(|e| manifest_error(name, e))?;
        bytes.push(b'\n');
        atomic_write(&self.manifest_path(name), &bytes)
    }

    fn description_path(&self, name: &str) -> PathBuf {
        self.description_dir(name)
    }

    fn exists(&self, name: &str) -> bool {
        self.manifest_path(name).is_file()
    }

    fn copy_description(&self, from: &str, to: &str) -> Result<()> {
        copy_dir_recursive(&self.description_dir(from), &self.description_dir(to))
    }

    fn rename_description(&self, from: &str, to: &str) -> Result<()> {
        let source = self.description_dir(from);
        fs::rename(&source, self.description_dir(to))
            .map_err(|e| io_error_at("rename_description", &source, e))
    }

    fn remove_description(&self, name: &str) -> Result<()> {
        let dir = self.description_dir(name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error_at("remove_description", &dir, e)),
        }
    }

    /// Names of directories holding a manifest, sorted
    fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error_at("list_descriptions", &self.root, e)),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_error_at("list_descriptions", &self.root, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with('.') && self.exists(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
