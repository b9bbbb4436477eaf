//! The top-level system description document.
//!
//! A description maps scope names to [`Scope`]s and carries a `meta` block
//! with the document's format version, persisted filter definitions and the
//! provenance of each scope:
//!
//! ```json
//! {
//!   "packages": {"_elements": [...]},
//!   "meta": {
//!     "format_version": 3,
//!     "filters": {"inspect": ["/packages/name=kernel-default"]},
//!     "packages": {"modified": "2026-01-01T00:00:00Z", "hostname": "host1"}
//!   }
//! }
//! ```
//!
//! Scopes are only typed when the document is at the current format version.
//! Older or newer documents keep every body untyped and refuse scope reads
//! with an error that names the version mismatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::errors::{Result, SysDescError};
use crate::file_store::{FileStore, NoFileStore};
use crate::filter::Filter;
use crate::node::{Mapping, Node};
use crate::scope::{scope_def, Scope, ScopeMeta};

/// Format version written by this implementation
pub const CURRENT_FORMAT_VERSION: u32 = 3;

const META_KEY: &str = "meta";
const FORMAT_VERSION_KEY: &str = "format_version";
const FILTERS_KEY: &str = "filters";

/// Where a document's format version stands relative to the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStatus {
    Current,
    NeedsUpgrade { version: u32 },
    Ahead { version: u32 },
    Unversioned,
}

pub struct SystemDescription {
    name: String,
    format_version: Option<u32>,
    current_version: u32,
    filters: BTreeMap<String, Vec<String>>,
    /// `meta.filters` was in the loaded document
    filters_present: bool,
    scopes: BTreeMap<String, Scope>,
    /// Unregistered top-level keys, and every body of a non-current document
    untyped: Mapping,
    /// `meta` entries not claimed by a typed scope
    extra_meta: Mapping,
    file_store: Arc<dyn FileStore>,
}

impl std::fmt::Debug for SystemDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemDescription")
            .field("name", &self.name)
            .field("format_version", &self.format_version)
            .field("scopes", &self.scopes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn malformed(reason: impl Into<String>) -> SysDescError {
    SysDescError::MalformedDocument {
        reason: reason.into(),
    }
}

impl SystemDescription {
    /// Empty description at the current format version
    pub fn new(name: impl Into<String>) -> Self {
        Self::empty(name.into(), CURRENT_FORMAT_VERSION, Arc::new(NoFileStore))
    }

    fn empty(name: String, current_version: u32, file_store: Arc<dyn FileStore>) -> Self {
        Self {
            name,
            format_version: Some(current_version),
            current_version,
            filters: BTreeMap::new(),
            filters_present: false,
            scopes: BTreeMap::new(),
            untyped: Mapping::new(),
            extra_meta: Mapping::new(),
            file_store,
        }
    }

    /// Type a raw document against [`CURRENT_FORMAT_VERSION`].
    ///
    /// # Errors
    ///
    /// `MalformedDocument` if the document or one of its scopes does not
    /// have the expected shape.
    pub fn from_raw(name: &str, raw: &Value, file_store: Arc<dyn FileStore>) -> Result<Self> {
        Self::from_raw_versioned(name, raw, file_store, CURRENT_FORMAT_VERSION)
    }

    /// Type a raw document against an explicit current format version.
    ///
    /// # Errors
    ///
    /// `MalformedDocument` if the document or one of its scopes does not
    /// have the expected shape.
    pub fn from_raw_versioned(
        name: &str,
        raw: &Value,
        file_store: Arc<dyn FileStore>,
        current_version: u32,
    ) -> Result<Self> {
        let Value::Object(top) = raw else {
            return Err(malformed(format!("description '{}' is not an object", name)));
        };
        let mut desc = Self::empty(name.to_string(), current_version, file_store);

        let mut meta = match top.get(META_KEY) {
            None => Map::new(),
            Some(Value::Object(meta)) => meta.clone(),
            Some(other) => return Err(malformed(format!("meta is {}", other))),
        };
        desc.format_version = match meta.remove(FORMAT_VERSION_KEY) {
            None => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| malformed(format!("format_version is {}", value)))?,
            ),
        };
        if let Some(filters) = meta.remove(FILTERS_KEY) {
            desc.filters = parse_filters(&filters)?;
            desc.filters_present = true;
        }

        let typed = desc.format_status() == FormatStatus::Current;
        for (key, body) in top.iter().filter(|(k, _)| k.as_str() != META_KEY) {
            if typed && scope_def(key).is_ok() {
                let mut scope = Scope::for_name(key, body, Some(&desc.file_store))?;
                if let Some(raw_meta) = meta.remove(key) {
                    let scope_meta: ScopeMeta = serde_json::from_value(raw_meta)
                        .map_err(|e| malformed(format!("meta of scope '{}': {}", key, e)))?;
                    scope.set_meta(Some(scope_meta));
                }
                desc.scopes.insert(key.clone(), scope);
            } else {
                desc.untyped.insert(key.clone(), Node::from_raw(body, None)?);
            }
        }
        for (key, value) in &meta {
            desc.extra_meta.insert(key.clone(), Node::from_raw(value, None)?);
        }
        Ok(desc)
    }

    pub fn to_raw(&self) -> Value {
        let mut top = Map::new();
        let mut meta = Map::new();

        if let Some(version) = self.format_version {
            meta.insert(FORMAT_VERSION_KEY.to_string(), Value::from(version));
        }
        // Documents of other versions keep their raw form until migrated
        if self.filters_present
            || !self.filters.is_empty()
            || self.format_status() == FormatStatus::Current
        {
            let filters: Map<String, Value> = self
                .filters
                .iter()
                .map(|(op, defs)| (op.clone(), Value::from(defs.clone())))
                .collect();
            meta.insert(FILTERS_KEY.to_string(), Value::Object(filters));
        }

        for (name, scope) in &self.scopes {
            top.insert(name.clone(), scope.to_raw());
            if let Some(scope_meta) = scope.meta() {
                // DateTime<Utc> and String always serialize
                if let Ok(raw_meta) = serde_json::to_value(scope_meta) {
                    meta.insert(name.clone(), raw_meta);
                }
            }
        }
        for (key, node) in self.untyped.iter() {
            top.insert(key.clone(), node.to_raw());
        }
        for (key, node) in self.extra_meta.iter() {
            meta.entry(key.clone()).or_insert_with(|| node.to_raw());
        }
        top.insert(META_KEY.to_string(), Value::Object(meta));
        Value::Object(top)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn format_version(&self) -> Option<u32> {
        self.format_version
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    pub fn format_status(&self) -> FormatStatus {
        match self.format_version {
            None => FormatStatus::Unversioned,
            Some(v) if v == self.current_version => FormatStatus::Current,
            Some(v) if v < self.current_version => FormatStatus::NeedsUpgrade { version: v },
            Some(v) => FormatStatus::Ahead { version: v },
        }
    }

    /// Fail unless the document is at the current format version.
    ///
    /// # Errors
    ///
    /// `NeedsUpgrade`, `FormatAhead` or `NotUpgradable` depending on the
    /// document's version.
    pub fn ensure_compatible(&self) -> Result<()> {
        match self.format_status() {
            FormatStatus::Current => Ok(()),
            FormatStatus::NeedsUpgrade { version } => Err(SysDescError::NeedsUpgrade {
                name: self.name.clone(),
                version,
                current: self.current_version,
            }),
            FormatStatus::Ahead { version } => Err(SysDescError::FormatAhead {
                name: self.name.clone(),
                version,
                current: self.current_version,
            }),
            FormatStatus::Unversioned => Err(SysDescError::NotUpgradable {
                name: self.name.clone(),
            }),
        }
    }

    /// Typed scope `name`, `None` if the description does not have it.
    ///
    /// # Errors
    ///
    /// A format error if the document is not current, `UnknownScope` for
    /// unregistered names.
    pub fn scope(&self, name: &str) -> Result<Option<&Scope>> {
        self.ensure_compatible()?;
        scope_def(name)?;
        Ok(self.scopes.get(name))
    }

    /// Add or replace a scope, attaching this description's file store.
    ///
    /// # Errors
    ///
    /// A format error if the document is not current.
    pub fn set_scope(&mut self, scope: Scope) -> Result<()> {
        self.ensure_compatible()?;
        self.insert_scope(scope);
        Ok(())
    }

    pub(crate) fn insert_scope(&mut self, mut scope: Scope) {
        scope.attach_file_store(&self.file_store);
        self.scopes.insert(scope.name().to_string(), scope);
    }

    pub fn remove_scope(&mut self, name: &str) -> Option<Scope> {
        self.scopes.remove(name)
    }

    /// Names of the typed scopes present, in name order
    pub fn scope_names(&self) -> Vec<&str> {
        self.scopes.keys().map(String::as_str).collect()
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }

    /// Top-level entries kept as generic nodes
    pub fn untyped(&self) -> &Mapping {
        &self.untyped
    }

    /// Fail unless every scope in `required` is present.
    ///
    /// # Errors
    ///
    /// A format error if the document is not current, `MissingScopes` listing
    /// every absent scope otherwise.
    pub fn assert_scopes(&self, required: &[&str]) -> Result<()> {
        self.ensure_compatible()?;
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !self.scopes.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SysDescError::MissingScopes {
                name: self.name.clone(),
                scopes: missing,
            })
        }
    }

    /// Persisted filter definitions for an operation such as `inspect`
    pub fn filter_definitions(&self, operation: &str) -> Option<&[String]> {
        self.filters.get(operation).map(Vec::as_slice)
    }

    pub fn set_filter_definitions(&mut self, operation: impl Into<String>, definitions: Vec<String>) {
        self.filters.insert(operation.into(), definitions);
    }

    /// Filter reconstructed from the definitions stored for `operation`.
    ///
    /// Empty when none are stored.
    ///
    /// # Errors
    ///
    /// `InvalidFilterDefinition` if a stored definition does not parse.
    pub fn filter(&self, operation: &str) -> Result<Filter> {
        match self.filters.get(operation) {
            Some(definitions) => Filter::from_definitions(definitions),
            None => Ok(Filter::default()),
        }
    }

    pub fn file_store(&self) -> &Arc<dyn FileStore> {
        &self.file_store
    }

    /// Replace the file store and re-point every scope at it
    pub fn set_file_store(&mut self, file_store: Arc<dyn FileStore>) {
        self.file_store = file_store;
        for scope in self.scopes.values_mut() {
            scope.attach_file_store(&self.file_store);
        }
    }
}

fn parse_filters(raw: &Value) -> Result<BTreeMap<String, Vec<String>>> {
    let Value::Object(ops) = raw else {
        return Err(malformed(format!("meta.filters is {}", raw)));
    };
    ops.iter()
        .map(|(op, defs)| {
            let defs: Vec<String> = serde_json::from_value(defs.clone())
                .map_err(|e| malformed(format!("meta.filters.{}: {}", op, e)))?;
            Ok((op.clone(), defs))
        })
        .collect()
}
