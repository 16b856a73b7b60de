//! Nested-path descent into cached payloads.
//!
//! APIs often wrap the interesting part of a response, e.g.
//! `{"data": {"items": [...]}}`. A [`NestedPath`] names the property chain
//! leading to the actual list or record.

use std::fmt;

use serde_json::Value;

/// An ordered sequence of property names. The empty path is the payload itself.
///
/// # Examples
///
/// ```
/// use reqcache::cache::NestedPath;
///
/// let path = NestedPath::from("data.items");
/// assert_eq!(path.segments(), ["data", "items"]);
/// assert!(NestedPath::from("").is_root());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NestedPath(Vec<String>);

impl NestedPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parses a dot-separated path; the empty string is the root.
impl From<&str> for NestedPath {
    fn from(path: &str) -> Self {
        Self::new(path.split('.').filter(|s| !s.is_empty()))
    }
}

impl From<&[&str]> for NestedPath {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for NestedPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for NestedPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for NestedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

// Objects are indexed by key, arrays by a decimal segment.
fn step<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Walks `path` into `payload` until an array is reached.
///
/// Descent stops at the first array, even if `path` has segments left.
/// Returns `None` if a segment is missing or the walk ends on a non-array.
///
/// # Examples
///
/// ```
/// use reqcache::cache::{extract_list, NestedPath};
/// use serde_json::json;
///
/// let payload = json!({"data": [{"id": 1}]});
/// let records = extract_list(&payload, &NestedPath::from("data.ignored")).unwrap();
/// assert_eq!(records.len(), 1);
/// ```
pub fn extract_list<'a>(payload: &'a Value, path: &NestedPath) -> Option<&'a Vec<Value>> {
    let mut current = payload;
    for segment in path.segments() {
        if let Value::Array(items) = current {
            return Some(items);
        }
        current = step(current, segment)?;
    }
    current.as_array()
}

/// Walks the full `path` into `payload` and returns the value at its end.
pub fn extract_occurrence<'a>(payload: &'a Value, path: &NestedPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(payload, |current, segment| step(current, segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_list() {
        let payload = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(extract_list(&payload, &NestedPath::root()).unwrap().len(), 2);
    }

    #[test]
    fn nested_list() {
        let payload = json!({"data": {"items": [{"id": 1}]}});
        let list = extract_list(&payload, &NestedPath::from(["data", "items"])).unwrap();
        assert_eq!(list, &vec![json!({"id": 1})]);
    }

    #[test]
    fn list_short_circuits_on_first_array() {
        let payload = json!({"data": [{"id": 1}]});
        let list = extract_list(&payload, &NestedPath::from("data.items.more")).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn list_missing_or_not_an_array() {
        let payload = json!({"data": {"items": {"id": 1}}});
        assert!(extract_list(&payload, &NestedPath::from("data.items")).is_none());
        assert!(extract_list(&payload, &NestedPath::from("nope")).is_none());
        assert!(extract_list(&json!(null), &NestedPath::root()).is_none());
    }

    #[test]
    fn occurrence_root_is_payload() {
        let payload = json!({"id": 7});
        assert_eq!(extract_occurrence(&payload, &NestedPath::root()), Some(&payload));
    }

    #[test]
    fn occurrence_walks_full_path() {
        let payload = json!({"result": {"record": {"id": 7}}});
        assert_eq!(
            extract_occurrence(&payload, &NestedPath::from("result.record")),
            Some(&json!({"id": 7}))
        );
        assert!(extract_occurrence(&payload, &NestedPath::from("result.missing")).is_none());
    }

    #[test]
    fn occurrence_indexes_arrays() {
        let payload = json!({"rows": [{"id": 1}, {"id": 2}]});
        assert_eq!(
            extract_occurrence(&payload, &NestedPath::from("rows.1")),
            Some(&json!({"id": 2}))
        );
        assert!(extract_occurrence(&payload, &NestedPath::from("rows.x")).is_none());
    }

    #[test]
    fn display_joins_with_dots() {
        assert_eq!(NestedPath::from(["a", "b"]).to_string(), "a.b");
        assert_eq!(NestedPath::root().to_string(), "");
    }
}
