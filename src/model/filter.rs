use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Filter inputs of a list view.
///
/// `search` is matched case-insensitively as a substring against any of
/// `search_fields`; every entry of `exact` must match its field exactly.
/// Field names may be dotted (`student.name`) to reach into nested objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default)]
    pub exact: BTreeMap<String, Value>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search<I, S>(mut self, needle: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search = needle.into();
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exact(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.exact.insert(field.into(), value.into());
        self
    }

    /// True when no criterion would reject a record
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.exact.is_empty()
    }
}
