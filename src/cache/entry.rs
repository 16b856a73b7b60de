//! Cache entries and the request signatures stored alongside them.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::compare::deep_equal;
use crate::http::{Headers, Method};

/// Which lookup strategy applies to an entry's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// The payload is, or contains via a nested path, an array of records.
    List,
    /// The payload is, or contains via a nested path, a single record.
    Occurrence,
}

/// The defining characteristics of the request that produced an entry.
///
/// `body` is present only when the request carried one and `headers` only
/// when the effective header set is non-empty, so an empty header set and an
/// absent one are indistinguishable.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    method: Method,
    body: Option<Value>,
    headers: Option<Headers>,
}

impl Signature {
    pub fn new(method: Method, body: Option<Value>, headers: Headers) -> Self {
        Self {
            method,
            body,
            headers: (!headers.is_empty()).then_some(headers),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    /// Returns `true` if both signatures describe the same wire request.
    pub fn matches(&self, other: &Signature) -> bool {
        deep_equal(&self.to_value(), &other.to_value())
    }

    /// Renders the signature as `{ method, body?, headers? }`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("method".into(), Value::String(self.method.as_str().into()));
        if let Some(body) = &self.body {
            map.insert("body".into(), body.clone());
        }
        if let Some(headers) = &self.headers {
            let headers = headers
                .iter()
                .map(|(name, value)| (name.to_owned(), Value::String(value.to_owned())))
                .collect();
            map.insert("headers".into(), Value::Object(headers));
        }
        Value::Object(map)
    }
}

/// The last successful response for one URL.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    last_fetch: Instant,
    signature: Signature,
    kind: EntryKind,
    payload: Value,
}

impl CacheEntry {
    pub(crate) fn new(kind: EntryKind, signature: Signature, payload: Value) -> Self {
        Self {
            last_fetch: Instant::now(),
            signature,
            kind,
            payload,
        }
    }

    /// When this entry was populated.
    pub fn last_fetch(&self) -> Instant {
        self.last_fetch
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// The parsed body exactly as the transport returned it.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns `true` once strictly more than `validity` has elapsed since the fetch.
    pub fn is_expired(&self, now: Instant, validity: Duration) -> bool {
        now.saturating_duration_since(self.last_fetch) > validity
    }
}
