//! Descriptors for record lookups and post-request invalidation.

use serde_json::Value;

use super::NestedPath;
use crate::compare::deep_equal;

/// Which record to look for, and where it sits inside cached payloads.
///
/// `list_path` applies to list entries, `occurrence_path` to occurrence
/// entries; both default to the payload root.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    key: String,
    value: Value,
    list_path: NestedPath,
    occurrence_path: NestedPath,
}

impl Lookup {
    /// Looks for a record whose `key` field equals `value`.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            list_path: NestedPath::root(),
            occurrence_path: NestedPath::root(),
        }
    }

    #[must_use]
    pub fn list_path(mut self, path: impl Into<NestedPath>) -> Self {
        self.list_path = path.into();
        self
    }

    #[must_use]
    pub fn occurrence_path(mut self, path: impl Into<NestedPath>) -> Self {
        self.occurrence_path = path.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn list_nested_path(&self) -> &NestedPath {
        &self.list_path
    }

    pub fn occurrence_nested_path(&self) -> &NestedPath {
        &self.occurrence_path
    }

    /// Returns `true` if `record[key]` equals the looked-up value.
    pub fn matches(&self, record: &Value) -> bool {
        record
            .get(&self.key)
            .is_some_and(|found| deep_equal(found, &self.value))
    }
}

/// Cache invalidation to apply after a successful request.
///
/// Applied in order: full clear, list clear, occurrence clear.
///
/// # Examples
///
/// ```
/// use reqcache::cache::Invalidation;
///
/// let inv = Invalidation::none().lists().occurrence(5, "data");
/// assert!(!inv.is_empty());
/// assert!(Invalidation::none().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invalidation {
    pub(crate) clear_all: bool,
    pub(crate) clear_lists: bool,
    pub(crate) clear_occurrence: Option<(Value, NestedPath)>,
}

impl Invalidation {
    /// Invalidates nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Drops every entry.
    #[must_use]
    pub fn all(mut self) -> Self {
        self.clear_all = true;
        self
    }

    /// Drops every list entry.
    #[must_use]
    pub fn lists(mut self) -> Self {
        self.clear_lists = true;
        self
    }

    /// Drops occurrence entries whose record at `path` carries `id`.
    #[must_use]
    pub fn occurrence(mut self, id: impl Into<Value>, path: impl Into<NestedPath>) -> Self {
        self.clear_occurrence = Some((id.into(), path.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.clear_all && !self.clear_lists && self.clear_occurrence.is_none()
    }
}
