//! Request parameters handed to the transport.

use serde_json::{Map, Value};

use super::{Headers, StatusCode};

/// Everything the transport needs to issue one call, minus the method.
///
/// The `url` doubles as the cache key. `options` is an open bag of
/// transport-specific flags that the cache never interprets.
///
/// # Examples
///
/// ```
/// use reqcache::http::{Headers, RequestParams};
/// use serde_json::json;
///
/// let params = RequestParams::new("/items")
///     .body(json!({"name": "widget"}))
///     .headers(Headers::new().with("X-Tenant", "acme"))
///     .option("auth", json!(false));
///
/// assert_eq!(params.url(), "/items");
/// assert_eq!(params.body_ref(), Some(&json!({"name": "widget"})));
/// assert_eq!(params.option_ref("auth"), Some(&json!(false)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    url: String,
    body: Option<Value>,
    headers: Option<Headers>,
    success_status: Option<StatusCode>,
    options: Map<String, Value>,
}

impl RequestParams {
    /// Creates parameters targeting `url` with no body, headers, or options.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the JSON request body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets caller-supplied headers; the transport merges them over its defaults.
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Requires the response to carry exactly this status to count as success.
    #[must_use]
    pub fn success_status(mut self, status: StatusCode) -> Self {
        self.success_status = Some(status);
        self
    }

    /// Sets one transport-specific option.
    #[must_use]
    pub fn option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Returns the target URL (also the cache key).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request body, if any.
    pub fn body_ref(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the caller-supplied headers, if any.
    pub fn headers_ref(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    /// Returns the success-status override, if any.
    pub fn success_status_ref(&self) -> Option<StatusCode> {
        self.success_status
    }

    /// Returns a transport option by name.
    pub fn option_ref(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Returns every transport option.
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }
}
