use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SysDescError};
use crate::filter::Filter;
use crate::model::{Element, ElementKind};
use crate::node::{Mapping, Node, Sequence};
use crate::scope::registry::{scope_def, ScopeDef, ScopeShape};
use crate::scope::{Scope, EXTRACTED_ATTRIBUTE};

/// Incrementally builds an element scope, consulting an exclusion filter
/// before each element enters the tree.
pub struct ScopeBuilder<'f> {
    def: &'static ScopeDef,
    kind: ElementKind,
    filter: Option<&'f Filter>,
    items: Vec<Node>,
    attributes: Mapping,
    excluded: usize,
}

impl<'f> ScopeBuilder<'f> {
    /// # Errors
    ///
    /// `UnknownScope`, or `MalformedDocument` for record scopes.
    pub fn new(name: &str, filter: Option<&'f Filter>) -> Result<Self> {
        let def = scope_def(name)?;
        let ScopeShape::Elements(kind) = def.shape else {
            return Err(SysDescError::MalformedDocument {
                reason: format!("scope '{}' is a record scope", name),
            });
        };
        Ok(Self {
            def,
            kind,
            filter,
            items: Vec::new(),
            attributes: Mapping::new(),
            excluded: 0,
        })
    }

    /// Add a raw element unless the filter excludes it.
    ///
    /// Returns whether the element was kept.
    ///
    /// # Errors
    ///
    /// `MalformedDocument` if a kept element does not fit the scope's kind.
    pub fn push_raw(&mut self, raw: &Value) -> Result<bool> {
        if self.is_excluded(raw) {
            return Ok(false);
        }
        self.items.push(Node::Element(Element::from_raw(self.kind, raw)?));
        Ok(true)
    }

    /// Typed variant of [`ScopeBuilder::push_raw`].
    ///
    /// # Errors
    ///
    /// `MalformedDocument` if the element is of another kind.
    pub fn push(&mut self, element: Element) -> Result<bool> {
        if element.kind() != self.kind {
            return Err(SysDescError::MalformedDocument {
                reason: format!(
                    "scope '{}' holds {} elements, got {}",
                    self.def.name,
                    self.kind.name(),
                    element.kind().name()
                ),
            });
        }
        if self.is_excluded(&element.to_raw()) {
            return Ok(false);
        }
        self.items.push(Node::Element(element));
        Ok(true)
    }

    fn is_excluded(&mut self, raw: &Value) -> bool {
        let excluded = self
            .filter
            .is_some_and(|filter| filter.matches_element(self.def.name, raw));
        if excluded {
            self.excluded += 1;
            debug!(scope = self.def.name, element = %raw, "element excluded by filter");
        }
        excluded
    }

    pub fn set_extracted(&mut self, extracted: bool) {
        self.attributes.insert(EXTRACTED_ATTRIBUTE, extracted);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded
    }

    pub fn finish(self) -> Scope {
        Scope::from_parts(self.def, self.attributes, Sequence::of(self.kind, self.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Package;
    use serde_json::json;

    #[test]
    fn test_filtered_elements_never_enter_the_scope() {
        let filter = Filter::new("/packages/name=kernel-default").unwrap();
        let mut builder = ScopeBuilder::new("packages", Some(&filter)).unwrap();

        assert!(builder
            .push_raw(&json!({"name": "bash", "version": "4.2"}))
            .unwrap());
        assert!(!builder
            .push_raw(&json!({"name": "kernel-default", "version": "3.0"}))
            .unwrap());
        assert!(!builder.push(Package::new("kernel-default", "4.0").into()).unwrap());

        assert_eq!(builder.excluded_count(), 2);
        let scope = builder.finish();
        assert_eq!(scope.elements().map(Sequence::len), Some(1));
    }

    #[test]
    fn test_excluded_malformed_element_is_not_typed() {
        let filter = Filter::new("/packages/name=junk").unwrap();
        let mut builder = ScopeBuilder::new("packages", Some(&filter)).unwrap();
        assert!(!builder.push_raw(&json!({"name": "junk", "bogus": 1})).unwrap());
    }

    #[test]
    fn test_record_scope_rejected() {
        assert!(ScopeBuilder::new("os", None).is_err());
    }

    #[test]
    fn test_extracted_flag_lands_in_attributes() {
        let mut builder = ScopeBuilder::new("unmanaged_files", None).unwrap();
        builder.set_extracted(true);
        assert!(builder.finish().is_extracted());
    }
}
