//! `reqwest`-backed [`Transport`].

use bytes::Bytes;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Transport, TransportError, TransportFuture};
use crate::http::{Headers, Method, RequestParams, StatusCode};

/// A JSON-over-HTTP transport.
///
/// Relative URLs are joined onto `base_url`; absolute `http(s)://` URLs are
/// used as-is. Every request carries `Accept: application/json`, any default
/// headers configured on the transport, `Content-Type: application/json` when
/// a body is present, and `Authorization: Bearer <token>` while a token is
/// set (unless the request sets the `auth` option to `false`). Caller
/// headers override all of the above.
///
/// # Examples
///
/// ```
/// use reqcache::http::RequestParams;
/// use reqcache::transport::{HttpTransport, Transport};
///
/// let transport = HttpTransport::new("https://api.example.com/v1");
/// transport.set_token(Some("secret".into()));
///
/// let headers = transport.build_headers(&RequestParams::new("/items"));
/// assert_eq!(headers.get("authorization"), Some("Bearer secret"));
/// ```
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    default_headers: Headers,
    token: RwLock<Option<String>>,
}

impl HttpTransport {
    /// Creates a transport with a fresh `reqwest` client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a transport on top of an existing client (shared pool, custom timeouts).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            default_headers: Headers::new(),
            token: RwLock::new(None),
        }
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    /// Sets or clears the bearer token.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    /// Returns the absolute URL a request to `url` would hit.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_owned()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }
}

impl Transport for HttpTransport {
    fn build_headers(&self, params: &RequestParams) -> Headers {
        let mut headers = Headers::new().with("Accept", "application/json");
        headers.merge(&self.default_headers);

        if params.body_ref().is_some() {
            headers.insert("Content-Type", "application/json");
        }

        let wants_auth = params.option_ref("auth") != Some(&Value::Bool(false));
        if wants_auth {
            let token = self.token.read();
            if let Some(token) = token.as_deref() {
                headers.insert("Authorization", format!("Bearer {token}"));
            }
        }

        if let Some(custom) = params.headers_ref() {
            headers.merge(custom);
        }
        headers
    }

    fn perform<'a>(&'a self, method: Method, params: &'a RequestParams) -> TransportFuture<'a> {
        Box::pin(self.execute(method, params))
    }
}

impl HttpTransport {
    async fn execute(&self, method: Method, params: &RequestParams) -> Result<Value, TransportError> {
        let url = self.resolve_url(params.url());
        let headers = self.build_headers(params);

        let mut request = self.client.request(method.into(), &url);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }
        if let Some(body) = params.body_ref() {
            request = request.json(body);
        }

        debug!(method = %method, url = %url, "sending request");
        let response = request.send().await?;
        let status = StatusCode::from_u16(response.status().as_u16());
        let bytes = response.bytes().await?;

        let accepted = match params.success_status_ref() {
            Some(expected) => status == expected,
            None => status.is_success(),
        };
        if !accepted {
            warn!(method = %method, url = %url, status = %status, "request rejected");
            return Err(TransportError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        decode_body(&bytes)
    }
}

/// Parses a response body as JSON. Empty bodies (e.g. `204`) decode as `null`.
fn decode_body(bytes: &Bytes) -> Result<Value, TransportError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| TransportError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_relative_and_absolute() {
        let t = HttpTransport::new("https://api.example.com/v1/");
        assert_eq!(t.resolve_url("/items"), "https://api.example.com/v1/items");
        assert_eq!(t.resolve_url("items/5"), "https://api.example.com/v1/items/5");
        assert_eq!(
            t.resolve_url("http://other.example.com/x"),
            "http://other.example.com/x"
        );
    }

    #[test]
    fn headers_without_body_or_token() {
        let t = HttpTransport::new("http://localhost");
        let h = t.build_headers(&RequestParams::new("/a"));
        assert_eq!(h.get("accept"), Some("application/json"));
        assert!(!h.contains("content-type"));
        assert!(!h.contains("authorization"));
    }

    #[test]
    fn body_adds_content_type() {
        let t = HttpTransport::new("http://localhost");
        let h = t.build_headers(&RequestParams::new("/a").body(json!({"x": 1})));
        assert_eq!(h.get("content-type"), Some("application/json"));
    }

    #[test]
    fn token_changes_headers() {
        let t = HttpTransport::new("http://localhost");
        let params = RequestParams::new("/a");
        let before = t.build_headers(&params);

        t.set_token(Some("abc".into()));
        let after = t.build_headers(&params);
        assert_ne!(before, after);
        assert_eq!(after.get("authorization"), Some("Bearer abc"));

        t.set_token(None);
        assert_eq!(t.build_headers(&params), before);
    }

    #[test]
    fn auth_option_suppresses_token() {
        let t = HttpTransport::new("http://localhost");
        t.set_token(Some("abc".into()));
        let h = t.build_headers(&RequestParams::new("/login").option("auth", json!(false)));
        assert!(!h.contains("authorization"));
    }

    #[test]
    fn caller_headers_win() {
        let t = HttpTransport::new("http://localhost").default_header("X-Client", "reqcache");
        let params =
            RequestParams::new("/a").headers(Headers::new().with("Accept", "text/csv"));
        let h = t.build_headers(&params);
        assert_eq!(h.get("accept"), Some("text/csv"));
        assert_eq!(h.get("x-client"), Some("reqcache"));
    }

    #[test]
    fn decode_empty_body_as_null() {
        assert_eq!(decode_body(&Bytes::new()).unwrap(), Value::Null);
        assert_eq!(decode_body(&Bytes::from_static(b" \n")).unwrap(), Value::Null);
    }

    #[test]
    fn decode_json_and_garbage() {
        let v = decode_body(&Bytes::from_static(br#"[{"id":5}]"#)).unwrap();
        assert_eq!(v, json!([{"id": 5}]));
        assert!(matches!(
            decode_body(&Bytes::from_static(b"<html>")),
            Err(TransportError::Decode(_))
        ));
    }

    // ── Over the wire ────────────────────────────────────────────────────────

    mod wire {
        use std::time::Duration;

        use wiremock::matchers::{body_json, header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use super::*;

        #[tokio::test]
        async fn get_decodes_json_body() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/items"))
                .and(header("accept", "application/json"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
                .expect(1)
                .mount(&server)
                .await;

            let t = HttpTransport::new(server.uri());
            let value = t.get(&RequestParams::new("/items")).await.unwrap();
            assert_eq!(value, json!([{"id": 1}]));
        }

        #[tokio::test]
        async fn post_sends_json_body_and_bearer_token() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/items"))
                .and(header("authorization", "Bearer abc"))
                .and(header("content-type", "application/json"))
                .and(body_json(json!({"name": "Ada"})))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
                .expect(1)
                .mount(&server)
                .await;

            let t = HttpTransport::new(server.uri());
            t.set_token(Some("abc".into()));
            let params = RequestParams::new("/items").body(json!({"name": "Ada"}));
            assert_eq!(t.post(&params).await.unwrap(), json!({"id": 7}));
        }

        #[tokio::test]
        async fn error_status_carries_code_and_body() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/missing"))
                .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/broken"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let t = HttpTransport::new(server.uri());

            let err = t.get(&RequestParams::new("/missing")).await.unwrap_err();
            assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
            assert_eq!(
                err,
                TransportError::Status {
                    status: StatusCode::NOT_FOUND,
                    body: "nope".into(),
                }
            );

            let err = t.get(&RequestParams::new("/broken")).await.unwrap_err();
            assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        }

        #[tokio::test]
        async fn success_status_is_exact() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/ok"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .and(path("/created"))
                .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
                .mount(&server)
                .await;

            let t = HttpTransport::new(server.uri());

            let rejected = RequestParams::new("/ok").success_status(StatusCode::CREATED);
            let err = t.post(&rejected).await.unwrap_err();
            assert_eq!(err.status(), Some(StatusCode::OK));

            let accepted = RequestParams::new("/created").success_status(StatusCode::CREATED);
            assert_eq!(t.post(&accepted).await.unwrap(), json!({"id": 1}));
        }

        #[tokio::test]
        async fn no_content_decodes_as_null() {
            let server = MockServer::start().await;
            Mock::given(method("DELETE"))
                .and(path("/items/3"))
                .respond_with(ResponseTemplate::new(204))
                .mount(&server)
                .await;

            let t = HttpTransport::new(server.uri());
            let value = t.delete(&RequestParams::new("/items/3")).await.unwrap();
            assert_eq!(value, Value::Null);
        }

        #[tokio::test]
        async fn non_json_body_is_a_decode_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
                .mount(&server)
                .await;

            let t = HttpTransport::new(server.uri());
            let err = t.get(&RequestParams::new("/page")).await.unwrap_err();
            assert!(matches!(err, TransportError::Decode(_)));
            assert_eq!(err.status(), None);
        }

        #[tokio::test]
        async fn slow_response_is_aborted() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!([]))
                        .set_delay(Duration::from_secs(2)),
                )
                .mount(&server)
                .await;

            let client = reqwest::Client::builder()
                .timeout(Duration::from_millis(100))
                .build()
                .unwrap();
            let t = HttpTransport::with_client(client, server.uri());
            let err = t.get(&RequestParams::new("/slow")).await.unwrap_err();
            assert_eq!(err, TransportError::Aborted);
        }

        #[tokio::test]
        async fn unreachable_host_is_a_network_error() {
            // Bind then drop a listener so the port is known to be closed.
            let port = {
                let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
                listener.local_addr().unwrap().port()
            };
            let t = HttpTransport::new(format!("http://127.0.0.1:{port}"));
            let err = t.get(&RequestParams::new("/items")).await.unwrap_err();
            assert!(matches!(err, TransportError::Network(_)), "got {err:?}");
            assert_eq!(err.status(), None);
        }

        #[tokio::test]
        async fn cache_serves_repeat_reads_without_the_server() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/users"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 42}])))
                .expect(1)
                .mount(&server)
                .await;

            let cache = crate::RequestCache::new(HttpTransport::new(server.uri()), "id");
            let params = RequestParams::new("/users");
            cache.read_list(Method::Get, &params).await.unwrap();
            cache.read_list(Method::Get, &params).await.unwrap();
            assert_eq!(cache.find(42).unwrap(), json!({"id": 42}));
        }
    }
}
