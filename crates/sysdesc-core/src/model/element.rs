use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{Result, SysDescError};
use crate::model::records::{
    ChangedFile, Group, OsInfo, Package, Pattern, Repository, Service, UnmanagedFile, User,
};

/// Declared element class of a typed sequence or record scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Package,
    Pattern,
    Repository,
    Service,
    User,
    Group,
    ChangedFile,
    UnmanagedFile,
    Os,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Package => "package",
            ElementKind::Pattern => "pattern",
            ElementKind::Repository => "repository",
            ElementKind::Service => "service",
            ElementKind::User => "user",
            ElementKind::Group => "group",
            ElementKind::ChangedFile => "changed_file",
            ElementKind::UnmanagedFile => "unmanaged_file",
            ElementKind::Os => "os",
        }
    }

    /// Fields that decide whether two records describe the same item
    ///
    /// Empty for record kinds that have no identity apart from their full
    /// contents.
    pub fn identity_fields(&self) -> &'static [&'static str] {
        match self {
            ElementKind::Repository => &["alias"],
            ElementKind::Os => &[],
            _ => &["name"],
        }
    }
}

/// Comparison identity of a node: the values of its kind's identity fields,
/// or its full serialized form when it has none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Vec<String>);

impl Identity {
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

/// A typed inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Package(Package),
    Pattern(Pattern),
    Repository(Repository),
    Service(Service),
    User(User),
    Group(Group),
    ChangedFile(ChangedFile),
    UnmanagedFile(UnmanagedFile),
    Os(OsInfo),
}

fn parse<T: DeserializeOwned>(kind: ElementKind, raw: &Value) -> Result<T> {
    serde_json::from_value(raw.clone()).map_err(|e| SysDescError::MalformedDocument {
        reason: format!("invalid {} element: {}", kind.name(), e),
    })
}

impl Element {
    /// Type a raw JSON object as a record of the given kind.
    ///
    /// # Errors
    ///
    /// `MalformedDocument` if the raw value is not an object carrying the
    /// kind's required fields with the declared types.
    pub fn from_raw(kind: ElementKind, raw: &Value) -> Result<Self> {
        Ok(match kind {
            ElementKind::Package => Element::Package(parse(kind, raw)?),
            ElementKind::Pattern => Element::Pattern(parse(kind, raw)?),
            ElementKind::Repository => Element::Repository(parse(kind, raw)?),
            ElementKind::Service => Element::Service(parse(kind, raw)?),
            ElementKind::User => Element::User(parse(kind, raw)?),
            ElementKind::Group => Element::Group(parse(kind, raw)?),
            ElementKind::ChangedFile => Element::ChangedFile(parse(kind, raw)?),
            ElementKind::UnmanagedFile => Element::UnmanagedFile(parse(kind, raw)?),
            ElementKind::Os => Element::Os(parse(kind, raw)?),
        })
    }

    pub fn to_raw(&self) -> Value {
        let raw = match self {
            Element::Package(r) => serde_json::to_value(r),
            Element::Pattern(r) => serde_json::to_value(r),
            Element::Repository(r) => serde_json::to_value(r),
            Element::Service(r) => serde_json::to_value(r),
            Element::User(r) => serde_json::to_value(r),
            Element::Group(r) => serde_json::to_value(r),
            Element::ChangedFile(r) => serde_json::to_value(r),
            Element::UnmanagedFile(r) => serde_json::to_value(r),
            Element::Os(r) => serde_json::to_value(r),
        };
        // Plain string/number/bool structs always serialize
        raw.unwrap_or(Value::Null)
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Package(_) => ElementKind::Package,
            Element::Pattern(_) => ElementKind::Pattern,
            Element::Repository(_) => ElementKind::Repository,
            Element::Service(_) => ElementKind::Service,
            Element::User(_) => ElementKind::User,
            Element::Group(_) => ElementKind::Group,
            Element::ChangedFile(_) => ElementKind::ChangedFile,
            Element::UnmanagedFile(_) => ElementKind::UnmanagedFile,
            Element::Os(_) => ElementKind::Os,
        }
    }

    /// Raw value of a single field, if set
    pub fn field(&self, name: &str) -> Option<Value> {
        match self.to_raw() {
            Value::Object(mut map) => map.remove(name),
            _ => None,
        }
    }

    /// The record's `name` (or `alias` for repositories)
    pub fn name(&self) -> &str {
        match self {
            Element::Package(r) => &r.name,
            Element::Pattern(r) => &r.name,
            Element::Repository(r) => &r.alias,
            Element::Service(r) => &r.name,
            Element::User(r) => &r.name,
            Element::Group(r) => &r.name,
            Element::ChangedFile(r) => &r.name,
            Element::UnmanagedFile(r) => &r.name,
            Element::Os(r) => &r.name,
        }
    }

    pub fn identity(&self) -> Identity {
        let fields = self.kind().identity_fields();
        if fields.is_empty() {
            return Identity(vec![self.to_raw().to_string()]);
        }
        let parts = fields
            .iter()
            .map(|f| match self.field(f) {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::new(),
            })
            .collect();
        Identity(parts)
    }
}

impl From<Package> for Element {
    fn from(r: Package) -> Self {
        Element::Package(r)
    }
}

impl From<Service> for Element {
    fn from(r: Service) -> Self {
        Element::Service(r)
    }
}

impl From<ChangedFile> for Element {
    fn from(r: ChangedFile) -> Self {
        Element::ChangedFile(r)
    }
}

impl From<UnmanagedFile> for Element {
    fn from(r: UnmanagedFile) -> Self {
        Element::UnmanagedFile(r)
    }
}

impl From<OsInfo> for Element {
    fn from(r: OsInfo) -> Self {
        Element::Os(r)
    }
}
