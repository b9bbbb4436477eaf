//! Comparison result types.

use serde_json::{Map, Value};

use crate::description::SystemDescription;
use crate::node::Node;
use crate::scope::Scope;

/// Which partition of a comparison to turn back into a description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    One,
    Two,
    Common,
}

/// Four-way partition of one scope across two descriptions.
///
/// `None` means "no data for this partition": a scope absent from one side
/// leaves that side's partition and both `changed` and `common` unset. When
/// both sides have the scope every partition is set, possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub scope: String,
    pub name1: String,
    pub name2: String,
    pub only_in1: Option<Scope>,
    pub only_in2: Option<Scope>,
    /// Pairs with the same identity but different contents, left side first
    pub changed: Option<Vec<(Node, Node)>>,
    pub common: Option<Scope>,
}

impl Comparison {
    pub(crate) fn empty(scope: &str, name1: &str, name2: &str) -> Self {
        Self {
            scope: scope.to_string(),
            name1: name1.to_string(),
            name2: name2.to_string(),
            only_in1: None,
            only_in2: None,
            changed: None,
            common: None,
        }
    }

    /// Synthetic one-sided description holding the chosen partition.
    ///
    /// The description is named after its side (`name1`, `name2`, or
    /// `name1_name2` for the common part) and is empty when that partition
    /// is unset.
    pub fn as_description(&self, side: Side) -> SystemDescription {
        let (name, scope) = match side {
            Side::One => (self.name1.clone(), &self.only_in1),
            Side::Two => (self.name2.clone(), &self.only_in2),
            Side::Common => (format!("{}_{}", self.name1, self.name2), &self.common),
        };
        let mut desc = SystemDescription::new(name);
        if let Some(scope) = scope {
            desc.insert_scope(scope.clone());
        }
        desc
    }

    /// True when neither side has anything the other lacks
    pub fn is_identical(&self) -> bool {
        let empty = |scope: &Option<Scope>| match scope {
            None => true,
            Some(scope) => scope.elements().is_some_and(|seq| seq.is_empty()),
        };
        let both_absent = self.only_in1.is_none() && self.only_in2.is_none() && self.common.is_none();
        if both_absent {
            return true;
        }
        self.common.is_some()
            && empty(&self.only_in1)
            && empty(&self.only_in2)
            && self.changed.as_ref().map_or(true, Vec::is_empty)
    }

    /// JSON form with `null` for unset partitions
    pub fn to_raw(&self) -> Value {
        let scope_raw = |scope: &Option<Scope>| scope.as_ref().map_or(Value::Null, Scope::to_raw);
        let changed = match &self.changed {
            None => Value::Null,
            Some(pairs) => Value::Array(
                pairs
                    .iter()
                    .map(|(a, b)| Value::Array(vec![a.to_raw(), b.to_raw()]))
                    .collect(),
            ),
        };

        let mut map = Map::new();
        map.insert("scope".to_string(), Value::from(self.scope.clone()));
        map.insert("name1".to_string(), Value::from(self.name1.clone()));
        map.insert("name2".to_string(), Value::from(self.name2.clone()));
        map.insert("only_in1".to_string(), scope_raw(&self.only_in1));
        map.insert("only_in2".to_string(), scope_raw(&self.only_in2));
        map.insert("changed".to_string(), changed);
        map.insert("common".to_string(), scope_raw(&self.common));
        Value::Object(map)
    }
}
