use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::errors::Result;
use crate::node::Node;

/// Unordered key → node association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Mapping {
    entries: BTreeMap<String, Node>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_raw(map: &Map<String, Value>) -> Result<Self> {
        let entries = map
            .iter()
            .map(|(k, v)| Ok((k.clone(), Node::from_raw(v, None)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { entries })
    }

    pub fn to_raw(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_raw()))
                .collect(),
        )
    }

    /// Insert a value, returning the previous one for that key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
