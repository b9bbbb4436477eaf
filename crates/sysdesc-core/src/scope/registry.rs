//! Static registry of known scopes.
//!
//! Scope names are `underscore_separated` inside documents; the CLI uses the
//! `hyphen-separated` form.

use crate::errors::{Result, SysDescError};
use crate::model::ElementKind;

/// How a scope's body is shaped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeShape {
    /// A sequence of records of one kind
    Elements(ElementKind),
    /// A single record
    Record(ElementKind),
}

impl ScopeShape {
    pub fn element_kind(&self) -> ElementKind {
        match self {
            ScopeShape::Elements(kind) | ScopeShape::Record(kind) => *kind,
        }
    }
}

#[derive(Debug)]
pub struct ScopeDef {
    pub name: &'static str,
    pub shape: ScopeShape,
    /// Whether the scope can carry extracted file content on disk
    pub extractable: bool,
}

pub static SCOPES: &[ScopeDef] = &[
    ScopeDef {
        name: "os",
        shape: ScopeShape::Record(ElementKind::Os),
        extractable: false,
    },
    ScopeDef {
        name: "packages",
        shape: ScopeShape::Elements(ElementKind::Package),
        extractable: false,
    },
    ScopeDef {
        name: "patterns",
        shape: ScopeShape::Elements(ElementKind::Pattern),
        extractable: false,
    },
    ScopeDef {
        name: "repositories",
        shape: ScopeShape::Elements(ElementKind::Repository),
        extractable: false,
    },
    ScopeDef {
        name: "services",
        shape: ScopeShape::Elements(ElementKind::Service),
        extractable: false,
    },
    ScopeDef {
        name: "users",
        shape: ScopeShape::Elements(ElementKind::User),
        extractable: false,
    },
    ScopeDef {
        name: "groups",
        shape: ScopeShape::Elements(ElementKind::Group),
        extractable: false,
    },
    ScopeDef {
        name: "changed_config_files",
        shape: ScopeShape::Elements(ElementKind::ChangedFile),
        extractable: true,
    },
    ScopeDef {
        name: "changed_managed_files",
        shape: ScopeShape::Elements(ElementKind::ChangedFile),
        extractable: true,
    },
    ScopeDef {
        name: "unmanaged_files",
        shape: ScopeShape::Elements(ElementKind::UnmanagedFile),
        extractable: true,
    },
];

/// Look up a registered scope by its document name.
///
/// # Errors
///
/// `UnknownScope` if no scope of that name is registered.
pub fn scope_def(name: &str) -> Result<&'static ScopeDef> {
    SCOPES
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| SysDescError::UnknownScope {
            scope: name.to_string(),
        })
}

pub fn all_scopes() -> &'static [ScopeDef] {
    SCOPES
}

pub fn is_extractable(name: &str) -> bool {
    scope_def(name).map(|def| def.extractable).unwrap_or(false)
}

/// `changed_config_files` → `changed-config-files`
pub fn cli_name(name: &str) -> String {
    name.replace('_', "-")
}

/// `changed-config-files` → `changed_config_files`
pub fn internal_name(cli: &str) -> String {
    cli.replace('-', "_")
}
