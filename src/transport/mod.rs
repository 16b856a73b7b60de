//! The transport capability the cache sits in front of.
//!
//! The cache never builds HTTP semantics itself. It only asks a [`Transport`]
//! two things: which headers a request would carry ([`Transport::build_headers`]),
//! and to actually perform a call ([`Transport::perform`]).
//!
//! [`HttpTransport`] is the bundled implementation on top of `reqwest`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::http::{Headers, Method, RequestParams, StatusCode};

mod client;

pub use self::client::HttpTransport;

/// Failures reported by a transport. The cache passes them through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed with status {status}")]
    Status { status: StatusCode, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request was aborted before completion")]
    Aborted,

    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Returns the HTTP status for [`TransportError::Status`], `None` otherwise.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Aborted
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Boxed future returned by [`Transport::perform`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>>;

/// A capability that can issue HTTP calls and report the parsed body.
///
/// # Contract
///
/// - [`build_headers`](Self::build_headers) is pure: it computes the headers
///   `perform` would send for `params` without sending anything. The cache
///   folds its result into request signatures, so anything that changes the
///   wire request (auth tokens, content type) must show up here.
/// - [`perform`](Self::perform) resolves to the parsed body on success or a
///   typed [`TransportError`]. Cancellation and timeouts are the transport's
///   own business.
pub trait Transport: Send + Sync {
    /// Computes the effective header set for `params`.
    fn build_headers(&self, params: &RequestParams) -> Headers;

    /// Performs `method` against `params`.
    fn perform<'a>(&'a self, method: Method, params: &'a RequestParams) -> TransportFuture<'a>;

    fn get<'a>(&'a self, params: &'a RequestParams) -> TransportFuture<'a> {
        self.perform(Method::Get, params)
    }

    fn post<'a>(&'a self, params: &'a RequestParams) -> TransportFuture<'a> {
        self.perform(Method::Post, params)
    }

    fn put<'a>(&'a self, params: &'a RequestParams) -> TransportFuture<'a> {
        self.perform(Method::Put, params)
    }

    fn patch<'a>(&'a self, params: &'a RequestParams) -> TransportFuture<'a> {
        self.perform(Method::Patch, params)
    }

    fn delete<'a>(&'a self, params: &'a RequestParams) -> TransportFuture<'a> {
        self.perform(Method::Delete, params)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn build_headers(&self, params: &RequestParams) -> Headers {
        (**self).build_headers(params)
    }

    fn perform<'a>(&'a self, method: Method, params: &'a RequestParams) -> TransportFuture<'a> {
        (**self).perform(method, params)
    }
}
