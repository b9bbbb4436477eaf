use std::collections::HashSet;

use serde_json::Value;

use crate::errors::Result;
use crate::model::ElementKind;
use crate::node::Node;

/// Ordered, heterogeneous list of nodes.
///
/// The declared element kind is the sequence's class: it takes part in
/// equality and is carried over by the set operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Sequence {
    element: Option<ElementKind>,
    items: Vec<Node>,
}

impl Sequence {
    /// Generic sequence with no declared element kind
    pub fn new(items: Vec<Node>) -> Self {
        Self {
            element: None,
            items,
        }
    }

    /// Sequence declaring `kind` as its element class
    pub fn of(kind: ElementKind, items: Vec<Node>) -> Self {
        Self {
            element: Some(kind),
            items,
        }
    }

    /// Generic sequence of strings
    pub fn from_strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(items.into_iter().map(|s| Node::String(s.into())).collect())
    }

    pub(crate) fn from_raw(items: &[Value], declared: Option<ElementKind>) -> Result<Self> {
        let items = items
            .iter()
            .map(|item| Node::from_raw(item, declared))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            element: declared,
            items,
        })
    }

    pub fn to_raw(&self) -> Value {
        Value::Array(self.items.iter().map(Node::to_raw).collect())
    }

    pub fn element_kind(&self) -> Option<ElementKind> {
        self.element
    }

    /// Same class, different items
    pub fn with_items(&self, items: Vec<Node>) -> Self {
        Self {
            element: self.element,
            items,
        }
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, item: impl Into<Node>) {
        self.items.push(item.into());
    }

    pub fn contains(&self, item: &Node) -> bool {
        self.items.contains(item)
    }

    pub fn into_items(self) -> Vec<Node> {
        self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Node> {
        &mut self.items
    }

    /// Items of `self` not present in `other`, in `self`'s order.
    pub fn difference(&self, other: &Sequence) -> Sequence {
        let other_items: HashSet<&Node> = other.items.iter().collect();
        self.with_items(
            self.items
                .iter()
                .filter(|item| !other_items.contains(item))
                .cloned()
                .collect(),
        )
    }

    /// Items of `self` also present in `other`, in `self`'s order.
    pub fn intersection(&self, other: &Sequence) -> Sequence {
        let other_items: HashSet<&Node> = other.items.iter().collect();
        self.with_items(
            self.items
                .iter()
                .filter(|item| other_items.contains(item))
                .cloned()
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
