//! Path-based exclusion filters.
//!
//! A filter maps element paths such as `/packages/name` to the values that
//! exclude an element at inspection time. Matching is exact; any expansion of
//! matcher lists (`@file` indirection) happens before the text reaches
//! [`Filter`].

mod element_filter;
mod parser;

pub use element_filter::ElementFilter;
pub use parser::{escape_matcher, parse_definition, split_definitions};

use std::collections::BTreeMap;

use serde_json::Value;

use crate::errors::Result;

/// Set of [`ElementFilter`]s keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    element_filters: BTreeMap<String, ElementFilter>,
}

impl Filter {
    /// Parse a comma-separated definition list; empty text gives an empty filter.
    ///
    /// # Errors
    ///
    /// `InvalidFilterDefinition` naming the offending fragment.
    pub fn new(text: &str) -> Result<Self> {
        Ok(Self {
            element_filters: Self::parse_filter_definition(text)?,
        })
    }

    /// Rebuild a filter from the strings [`Filter::to_array`] produced.
    ///
    /// Each entry is a single definition, so commas inside it separate
    /// matchers rather than definitions.
    ///
    /// # Errors
    ///
    /// `InvalidFilterDefinition` for an entry that does not parse.
    pub fn from_definitions(definitions: &[String]) -> Result<Self> {
        let mut filter = Self::default();
        for definition in definitions {
            let (path, matchers) = parse_definition(definition)?;
            filter.merge(path, matchers);
        }
        Ok(filter)
    }

    /// Parse definition text into one [`ElementFilter`] per path.
    ///
    /// # Errors
    ///
    /// `InvalidFilterDefinition` naming the offending fragment.
    pub fn parse_filter_definition(text: &str) -> Result<BTreeMap<String, ElementFilter>> {
        let mut parsed = Self::default();
        for definition in split_definitions(text)? {
            let (path, matchers) = parse_definition(&definition)?;
            parsed.merge(path, matchers);
        }
        Ok(parsed.element_filters)
    }

    /// Merge rules into this filter, extending the matchers of known paths.
    ///
    /// # Errors
    ///
    /// `InvalidFilterDefinition`; the filter is left unchanged on error.
    pub fn add_filter_definition(&mut self, text: &str) -> Result<()> {
        for (path, filter) in Self::parse_filter_definition(text)? {
            self.merge(path, filter.matchers().iter().cloned());
        }
        Ok(())
    }

    /// Drop the given matchers; paths left without matchers are removed.
    ///
    /// # Errors
    ///
    /// `InvalidFilterDefinition`; the filter is left unchanged on error.
    pub fn remove_filter_definition(&mut self, text: &str) -> Result<()> {
        for (path, filter) in Self::parse_filter_definition(text)? {
            if let Some(existing) = self.element_filters.get_mut(&path) {
                existing.remove_matchers(filter.matchers());
                if existing.matchers().is_empty() {
                    self.element_filters.remove(&path);
                }
            }
        }
        Ok(())
    }

    fn merge<I, S>(&mut self, path: String, matchers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.element_filters
            .entry(path.clone())
            .or_insert_with(|| ElementFilter::new(path))
            .add_matchers(matchers);
    }

    /// Whether `value` is excluded at `path`
    pub fn matches(&self, path: &str, value: &str) -> bool {
        self.element_filters
            .get(path)
            .is_some_and(|filter| filter.matches(value))
    }

    /// Whether a raw element of `scope` is excluded.
    ///
    /// Every string field, and every string inside an array field, is checked
    /// against the rule for `/<scope>/<field>`.
    pub fn matches_element(&self, scope: &str, element: &Value) -> bool {
        let Value::Object(fields) = element else {
            return false;
        };
        fields.iter().any(|(field, value)| {
            let path = format!("/{}/{}", scope, field);
            match value {
                Value::String(s) => self.matches(&path, s),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|s| self.matches(&path, s)),
                _ => false,
            }
        })
    }

    pub fn element_filter_for(&self, path: &str) -> Option<&ElementFilter> {
        self.element_filters.get(path)
    }

    pub fn element_filters(&self) -> impl Iterator<Item = &ElementFilter> {
        self.element_filters.values()
    }

    pub fn is_empty(&self) -> bool {
        self.element_filters.is_empty()
    }

    /// One `path=matcher,...` string per path, ordered by path
    pub fn to_array(&self) -> Vec<String> {
        self.element_filters
            .values()
            .map(ElementFilter::to_definition)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_text_gives_empty_filter() {
        let filter = Filter::new("").unwrap();
        assert!(filter.is_empty());
        assert!(!filter.matches("/packages/name", "bash"));
    }

    #[test]
    fn test_same_path_accumulates_in_one_parse() {
        let parsed = Filter::parse_filter_definition("/a=x,/a=y,/a=x").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed["/a"].matchers(), &["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_matches_element_checks_string_and_array_fields() {
        let filter = Filter::new("/groups/users=alice,/packages/name=bash").unwrap();

        assert!(filter.matches_element("packages", &json!({"name": "bash", "version": "4"})));
        assert!(!filter.matches_element("packages", &json!({"name": "zsh", "version": "5"})));
        assert!(filter.matches_element("groups", &json!({"name": "wheel", "users": ["bob", "alice"]})));
        assert!(!filter.matches_element("services", &json!({"name": "bash"})));
    }
}
