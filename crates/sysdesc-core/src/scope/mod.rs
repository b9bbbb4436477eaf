//! Scopes: the typed roots of one inventory category each.

mod builder;
pub mod registry;

pub use builder::ScopeBuilder;
pub use registry::{all_scopes, cli_name, internal_name, scope_def, ScopeDef, ScopeShape};

use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ExError, ExErrorKind, Result, SysDescError};
use crate::file_store::FileStore;
use crate::model::Element;
use crate::node::{Mapping, Node, Sequence};

const ATTRIBUTES_KEY: &str = "_attributes";
const ELEMENTS_KEY: &str = "_elements";
const EXTRACTED_ATTRIBUTE: &str = "extracted";
const FILES_KEY: &str = "files";

/// Provenance of a scope: where and when it was inspected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMeta {
    pub modified: DateTime<Utc>,
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeBody {
    Elements(Sequence),
    Record(Element),
}

/// One inventory category of a system description.
///
/// Equality and hashing cover the scope name, its attributes and its body;
/// provenance metadata and the file-store handle are ignored.
#[derive(Debug, Clone)]
pub struct Scope {
    def: &'static ScopeDef,
    attributes: Mapping,
    body: ScopeBody,
    meta: Option<ScopeMeta>,
    file_store: Option<Weak<dyn FileStore>>,
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.def.name == other.def.name
            && self.attributes == other.attributes
            && self.body == other.body
    }
}

impl Eq for Scope {}

impl Hash for Scope {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.def.name.hash(state);
        self.attributes.hash(state);
        self.body.hash(state);
    }
}

fn malformed(scope: &str, reason: impl std::fmt::Display) -> SysDescError {
    SysDescError::MalformedDocument {
        reason: format!("scope '{}': {}", scope, reason),
    }
}

impl Scope {
    /// Type the raw body of scope `name` with its registered class.
    ///
    /// Element scopes accept the current `{"_attributes", "_elements"}`
    /// object or a bare array. Extractable scopes also accept
    /// `{"extracted", "files"}`, which is written back in the current form.
    /// The file store is kept as a non-owning handle.
    ///
    /// # Errors
    ///
    /// `UnknownScope` for unregistered names, `MalformedDocument` if the body
    /// does not fit the scope's shape.
    pub fn for_name(
        name: &str,
        raw: &Value,
        file_store: Option<&Arc<dyn FileStore>>,
    ) -> Result<Self> {
        let def = scope_def(name)?;
        let (attributes, body) = match def.shape {
            ScopeShape::Record(kind) => {
                let record = Element::from_raw(kind, raw)?;
                (Mapping::new(), ScopeBody::Record(record))
            }
            ScopeShape::Elements(kind) => {
                let (attributes, items) = match raw {
                    Value::Array(items) => (Mapping::new(), items.as_slice()),
                    Value::Object(map) if def.extractable && is_file_list_body(map) => {
                        split_file_list_body(name, map)?
                    }
                    Value::Object(map) => split_element_body(name, map)?,
                    other => return Err(malformed(name, format!("unexpected body {}", other))),
                };
                let seq = Sequence::from_raw(items, Some(kind))?;
                (attributes, ScopeBody::Elements(seq))
            }
        };
        Ok(Self {
            def,
            attributes,
            body,
            meta: None,
            file_store: file_store.map(Arc::downgrade),
        })
    }

    /// Element scope holding `elements`.
    ///
    /// # Errors
    ///
    /// `UnknownScope`, or `MalformedDocument` if the scope is a record scope
    /// or an element is of the wrong kind.
    pub fn from_elements(name: &str, elements: Vec<Element>) -> Result<Self> {
        let def = scope_def(name)?;
        let kind = match def.shape {
            ScopeShape::Elements(kind) => kind,
            ScopeShape::Record(_) => return Err(malformed(name, "is a record scope")),
        };
        if let Some(wrong) = elements.iter().find(|e| e.kind() != kind) {
            return Err(malformed(
                name,
                format!("expected {} elements, got {}", kind.name(), wrong.kind().name()),
            ));
        }
        let items = elements.into_iter().map(Node::Element).collect();
        Ok(Self {
            def,
            attributes: Mapping::new(),
            body: ScopeBody::Elements(Sequence::of(kind, items)),
            meta: None,
            file_store: None,
        })
    }

    /// Record scope holding `record`.
    ///
    /// # Errors
    ///
    /// `UnknownScope`, or `MalformedDocument` on a shape/kind mismatch.
    pub fn from_record(name: &str, record: Element) -> Result<Self> {
        let def = scope_def(name)?;
        match def.shape {
            ScopeShape::Record(kind) if kind == record.kind() => Ok(Self {
                def,
                attributes: Mapping::new(),
                body: ScopeBody::Record(record),
                meta: None,
                file_store: None,
            }),
            _ => Err(malformed(name, format!("cannot hold a {} record", record.kind().name()))),
        }
    }

    pub(crate) fn from_parts(def: &'static ScopeDef, attributes: Mapping, seq: Sequence) -> Self {
        Self {
            def,
            attributes,
            body: ScopeBody::Elements(seq),
            meta: None,
            file_store: None,
        }
    }

    /// Scope of the same class and attributes holding other elements
    ///
    /// Metadata is not carried over.
    pub fn with_elements(&self, elements: Sequence) -> Self {
        Self {
            def: self.def,
            attributes: self.attributes.clone(),
            body: ScopeBody::Elements(elements),
            meta: None,
            file_store: self.file_store.clone(),
        }
    }

    pub fn to_raw(&self) -> Value {
        match &self.body {
            ScopeBody::Record(record) => record.to_raw(),
            ScopeBody::Elements(seq) => {
                let mut map = Map::new();
                if !self.attributes.is_empty() {
                    map.insert(ATTRIBUTES_KEY.to_string(), self.attributes.to_raw());
                }
                map.insert(ELEMENTS_KEY.to_string(), seq.to_raw());
                Value::Object(map)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn def(&self) -> &'static ScopeDef {
        self.def
    }

    pub fn body(&self) -> &ScopeBody {
        &self.body
    }

    pub fn elements(&self) -> Option<&Sequence> {
        match &self.body {
            ScopeBody::Elements(seq) => Some(seq),
            ScopeBody::Record(_) => None,
        }
    }

    pub fn record(&self) -> Option<&Element> {
        match &self.body {
            ScopeBody::Record(record) => Some(record),
            ScopeBody::Elements(_) => None,
        }
    }

    pub fn attributes(&self) -> &Mapping {
        &self.attributes
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Node>) {
        self.attributes.insert(key, value);
    }

    pub fn is_extractable(&self) -> bool {
        self.def.extractable
    }

    /// Whether file content for this scope was captured to disk
    pub fn is_extracted(&self) -> bool {
        self.attributes
            .get(EXTRACTED_ATTRIBUTE)
            .and_then(Node::as_bool)
            .unwrap_or(false)
    }

    pub fn set_extracted(&mut self, extracted: bool) {
        self.attributes.insert(EXTRACTED_ATTRIBUTE, extracted);
    }

    pub fn meta(&self) -> Option<&ScopeMeta> {
        self.meta.as_ref()
    }

    /// Attach provenance; does not affect equality
    pub fn set_metadata(&mut self, modified: DateTime<Utc>, hostname: impl Into<String>) {
        self.meta = Some(ScopeMeta {
            modified,
            hostname: hostname.into(),
        });
    }

    pub(crate) fn set_meta(&mut self, meta: Option<ScopeMeta>) {
        self.meta = meta;
    }

    pub(crate) fn attach_file_store(&mut self, store: &Arc<dyn FileStore>) {
        self.file_store = Some(Arc::downgrade(store));
    }

    /// Extracted content of the file recorded as `path`.
    ///
    /// `None` if the scope was not extracted or has no file store attached.
    ///
    /// # Errors
    ///
    /// `Internal` if the owning description dropped its file store, otherwise
    /// whatever the store reports.
    pub fn file_content(&self, path: &str) -> std::result::Result<Option<Vec<u8>>, ExError> {
        if !self.is_extracted() {
            return Ok(None);
        }
        let Some(handle) = &self.file_store else {
            return Ok(None);
        };
        let store = handle.upgrade().ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op("file_content")
                .with_entity_id(self.def.name)
                .with_message("file store of the owning description is gone")
        })?;
        store.read_file(self.def.name, path)
    }
}

fn is_file_list_body(map: &Map<String, Value>) -> bool {
    map.contains_key(FILES_KEY)
        && map
            .keys()
            .all(|k| k.as_str() == FILES_KEY || k.as_str() == EXTRACTED_ATTRIBUTE)
}

fn split_file_list_body<'a>(
    name: &str,
    map: &'a Map<String, Value>,
) -> Result<(Mapping, &'a [Value])> {
    let mut attributes = Mapping::new();
    match map.get(EXTRACTED_ATTRIBUTE) {
        None => {}
        Some(Value::Bool(extracted)) => {
            attributes.insert(EXTRACTED_ATTRIBUTE, *extracted);
        }
        Some(other) => return Err(malformed(name, format!("extracted is {}", other))),
    }
    let items = match map.get(FILES_KEY) {
        Some(Value::Array(items)) => items.as_slice(),
        other => return Err(malformed(name, format!("files is {:?}", other))),
    };
    Ok((attributes, items))
}

fn split_element_body<'a>(
    name: &str,
    map: &'a Map<String, Value>,
) -> Result<(Mapping, &'a [Value])> {
    if let Some(unexpected) = map
        .keys()
        .find(|k| k.as_str() != ATTRIBUTES_KEY && k.as_str() != ELEMENTS_KEY)
    {
        return Err(malformed(name, format!("unexpected key '{}'", unexpected)));
    }
    let attributes = match map.get(ATTRIBUTES_KEY) {
        None => Mapping::new(),
        Some(Value::Object(attrs)) => Mapping::from_raw(attrs)?,
        Some(other) => return Err(malformed(name, format!("_attributes is {}", other))),
    };
    let items = match map.get(ELEMENTS_KEY) {
        None => &[][..],
        Some(Value::Array(items)) => items.as_slice(),
        Some(other) => return Err(malformed(name, format!("_elements is {}", other))),
    };
    Ok((attributes, items))
}
