use crate::filter::parser::escape_matcher;

/// Exclusion rule for one element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFilter {
    path: String,
    matchers: Vec<String>,
}

impl ElementFilter {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            matchers: Vec::new(),
        }
    }

    pub fn with_matchers<I, S>(path: impl Into<String>, matchers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::new(path);
        filter.add_matchers(matchers);
        filter
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn matchers(&self) -> &[String] {
        &self.matchers
    }

    /// Union `matchers` into this filter, keeping first-seen order
    pub fn add_matchers<I, S>(&mut self, matchers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for matcher in matchers {
            let matcher = matcher.into();
            if !self.matchers.contains(&matcher) {
                self.matchers.push(matcher);
            }
        }
    }

    pub fn remove_matchers(&mut self, matchers: &[String]) {
        self.matchers.retain(|m| !matchers.contains(m));
    }

    pub fn matches(&self, value: &str) -> bool {
        self.matchers.iter().any(|m| m == value)
    }

    /// `path=matcher,matcher` with matcher commas escaped
    pub fn to_definition(&self) -> String {
        let matchers: Vec<String> = self.matchers.iter().map(|m| escape_matcher(m)).collect();
        format!("{}={}", self.path, matchers.join(","))
    }
}
