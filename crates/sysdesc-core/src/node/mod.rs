//! Polymorphic document tree.
//!
//! A [`Node`] is either a scalar, a [`Sequence`], a [`Mapping`] or a typed
//! [`Element`]. Conversion from and to the raw decoded-JSON form is uniform
//! at every depth:
//!
//! - JSON array → `Sequence` (items typed as the declared element kind, if any)
//! - JSON object → `Element` when a kind is declared and the object fits it,
//!   otherwise `Mapping`
//! - scalars pass through
//!
//! Equality and hashing are structural and class-sensitive: a generic
//! sequence never equals a typed one, and an element never equals a mapping
//! with the same fields.
//!
//! Typed information is only recovered where the caller declares it. A typed
//! element nested inside a generic mapping comes back as a plain mapping after
//! a `to_raw`/`from_raw` cycle.

mod mapping;
mod sequence;

pub use mapping::Mapping;
pub use sequence::Sequence;

use serde_json::{Number, Value};

use crate::errors::Result;
use crate::model::{Element, ElementKind, Identity};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Sequence),
    Mapping(Mapping),
    Element(Element),
}

impl Node {
    /// Type a raw decoded-JSON value.
    ///
    /// An object that lacks the declared kind's required fields, or carries
    /// them with other types, is kept as a generic mapping.
    pub fn from_raw(raw: &Value, declared: Option<ElementKind>) -> Result<Self> {
        Ok(match raw {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n.clone()),
            Value::String(s) => Node::String(s.clone()),
            Value::Array(items) => Node::Sequence(Sequence::from_raw(items, declared)?),
            Value::Object(map) => match declared.map(|kind| Element::from_raw(kind, raw)) {
                Some(Ok(element)) => Node::Element(element),
                Some(Err(_)) | None => Node::Mapping(Mapping::from_raw(map)?),
            },
        })
    }

    pub fn to_raw(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Sequence(seq) => seq.to_raw(),
            Node::Mapping(map) => map.to_raw(),
            Node::Element(element) => element.to_raw(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Node::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Identity used to pair nodes across two trees
    pub fn identity(&self) -> Identity {
        match self {
            Node::Element(element) => element.identity(),
            other => Identity::new(vec![other.to_raw().to_string()]),
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Number(n.into())
    }
}

impl From<u64> for Node {
    fn from(n: u64) -> Self {
        Node::Number(n.into())
    }
}

impl From<Sequence> for Node {
    fn from(seq: Sequence) -> Self {
        Node::Sequence(seq)
    }
}

impl From<Mapping> for Node {
    fn from(map: Mapping) -> Self {
        Node::Mapping(map)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_pass_through() {
        for raw in [json!(null), json!(true), json!(42), json!(1.5), json!("x")] {
            let node = Node::from_raw(&raw, None).unwrap();
            assert_eq!(node.to_raw(), raw);
        }
    }

    #[test]
    fn test_deep_nesting_is_typed_uniformly() {
        let raw = json!({"a": [{"b": [[1, 2], {"c": null}]}]});
        let node = Node::from_raw(&raw, None).unwrap();

        let inner = node.as_mapping().unwrap().get("a").unwrap();
        let first = inner.as_sequence().unwrap().iter().next().unwrap();
        assert!(first.as_mapping().is_some());
        assert_eq!(node.to_raw(), raw);
    }

    #[test]
    fn test_declared_kind_types_objects_as_elements() {
        let raw = json!({"name": "sshd", "state": "enabled"});
        let node = Node::from_raw(&raw, Some(ElementKind::Service)).unwrap();
        assert!(node.as_element().is_some());

        let generic = Node::from_raw(&raw, None).unwrap();
        assert_ne!(node, generic);
    }

    #[test]
    fn test_object_not_fitting_declared_kind_stays_generic() {
        let raw = json!({"name": "sshd", "state": 1});
        let node = Node::from_raw(&raw, Some(ElementKind::Service)).unwrap();
        assert!(node.as_mapping().is_some());
        assert_eq!(node.to_raw(), raw);
    }
}
