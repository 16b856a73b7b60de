//! # reqcache
//!
//! A client-side request cache that sits in front of an async HTTP transport.
//!
//! Repeated calls are short-circuited by remembering the last successful
//! response per URL together with a signature of the request that produced
//! it. Cached payloads are tagged as lists or single occurrences so that an
//! individual record can later be found inside either shape.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reqcache::cache::{Invalidation, NestedPath, RequestCache};
//! use reqcache::http::{Method, RequestParams};
//! use reqcache::transport::HttpTransport;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = RequestCache::new(HttpTransport::new("https://api.example.com"), "id");
//!
//!     // First call hits the network, the second is served from memory.
//!     cache.read_list(Method::Get, &RequestParams::new("/users")).await?;
//!     cache.read_list(Method::Get, &RequestParams::new("/users")).await?;
//!
//!     // Individual records are found inside the cached list.
//!     let user = cache.find(42)?;
//!     println!("{user}");
//!
//!     // Mutations invalidate what they make stale.
//!     let params = RequestParams::new("/users/42").body(json!({"name": "Ada"}));
//!     cache.update(42, Method::Patch, &params, &NestedPath::root()).await?;
//!     cache
//!         .generic_request(Method::Post, &RequestParams::new("/logout"), &Invalidation::none().all())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod compare;
pub mod config;
pub mod http;
pub mod transport;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use cache::{CacheError, CacheResult, EntryKind, Lookup, NestedPath, RequestCache};
pub use config::CacheConfig;
pub use http::{Headers, Method, RequestParams, StatusCode};
pub use transport::{HttpTransport, Transport, TransportError};
