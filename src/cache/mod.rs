//! The request cache engine.
//!
//! [`RequestCache`] remembers the last successful response per URL and serves
//! it again while the incoming request carries the same [`Signature`] and the
//! entry is still fresh. Entries are tagged [`EntryKind::List`] or
//! [`EntryKind::Occurrence`] so individual records can be found inside either
//! shape without another round-trip.
//!
//! ## Read path
//!
//! 1. Expired entries are swept (skipped in eternal mode).
//! 2. The entry under `params.url()` is a hit iff its signature matches the
//!    one computed for the incoming request.
//! 3. Otherwise the transport is called; a success replaces the entry, a
//!    failure propagates and leaves the cache untouched.
//!
//! ## Concurrency
//!
//! Entries live in a sharded [`DashMap`]; shard guards are only held for
//! synchronous map work, never across a transport `.await`. Identical
//! requests are not coalesced: two concurrent misses both reach the
//! transport and the later completion wins.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::CacheConfig;
use crate::http::{Method, RequestParams, UnsupportedMethod};
use crate::transport::{Transport, TransportError};

mod entry;
mod lookup;
mod path;
mod stats;

pub use entry::{CacheEntry, EntryKind, Signature};
pub use lookup::{Invalidation, Lookup};
pub use path::{NestedPath, extract_list, extract_occurrence};
pub use stats::CacheStats;

use stats::Counters;

/// Errors surfaced by cache operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    /// The transport failed; passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No live cached record has `key == value`.
    #[error("no cached record with {key} = {value}")]
    NotFound { key: String, value: Value },

    #[error(transparent)]
    UnsupportedMethod(#[from] UnsupportedMethod),
}

impl CacheError {
    /// Returns `true` for a cache lookup miss, as opposed to a transport failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A signature-aware, TTL-bounded cache in front of a [`Transport`].
///
/// # Examples
///
/// ```rust,no_run
/// use reqcache::cache::RequestCache;
/// use reqcache::http::{Method, RequestParams};
/// use reqcache::transport::HttpTransport;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = RequestCache::new(HttpTransport::new("https://api.example.com"), "id");
///
/// let items = cache.read_list(Method::Get, &RequestParams::new("/items")).await?;
/// let item = cache.find(5)?;
/// # Ok(())
/// # }
/// ```
pub struct RequestCache {
    transport: RwLock<Arc<dyn Transport>>,
    config: CacheConfig,
    store: DashMap<String, CacheEntry>,
    counters: Counters,
}

impl RequestCache {
    /// Creates a cache with the default configuration keyed on `id_key`.
    pub fn new(transport: impl Transport + 'static, id_key: impl Into<String>) -> Self {
        Self::with_config(transport, CacheConfig::new(id_key))
    }

    pub fn with_config(transport: impl Transport + 'static, config: CacheConfig) -> Self {
        Self {
            transport: RwLock::new(Arc::new(transport)),
            config,
            store: DashMap::new(),
            counters: Counters::default(),
        }
    }

    /// Swaps the transport. Existing entries are kept.
    pub fn set_transport(&self, transport: impl Transport + 'static) {
        *self.transport.write() = Arc::new(transport);
        debug!("transport rebound");
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn id_key(&self) -> &str {
        &self.config.id_key
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    fn transport(&self) -> Arc<dyn Transport> {
        self.transport.read().clone()
    }

    // ── Signatures ───────────────────────────────────────────────────────────

    /// Computes the signature the transport would give `(method, params)`.
    ///
    /// Headers come from [`Transport::build_headers`], so anything the
    /// transport adds on its own (auth tokens, content type) takes part.
    pub fn build_signature(&self, method: Method, params: &RequestParams) -> Signature {
        let headers = self.transport().build_headers(params);
        Signature::new(method, params.body_ref().cloned(), headers)
    }

    // ── Read path ────────────────────────────────────────────────────────────

    /// Reads a list-shaped response, served from the cache when possible.
    pub async fn read_list(&self, method: Method, params: &RequestParams) -> CacheResult<Value> {
        self.cached_read(EntryKind::List, method, params).await
    }

    /// Reads a single-record response, served from the cache when possible.
    pub async fn read_occurrence(
        &self,
        method: Method,
        params: &RequestParams,
    ) -> CacheResult<Value> {
        self.cached_read(EntryKind::Occurrence, method, params)
            .await
    }

    async fn cached_read(
        &self,
        kind: EntryKind,
        method: Method,
        params: &RequestParams,
    ) -> CacheResult<Value> {
        self.purge_expired();

        let signature = self.build_signature(method, params);
        if let Some(payload) = self.hit(params.url(), &signature) {
            self.counters.hit();
            debug!(url = params.url(), method = %method, "cache hit");
            return Ok(payload);
        }

        self.counters.miss();
        debug!(url = params.url(), method = %method, kind = ?kind, "cache miss");
        self.fetch_and_store(kind, method, params, signature).await
    }

    fn hit(&self, url: &str, signature: &Signature) -> Option<Value> {
        self.store
            .get(url)
            .filter(|entry| entry.signature().matches(signature))
            .map(|entry| entry.payload().clone())
    }

    async fn fetch_and_store(
        &self,
        kind: EntryKind,
        method: Method,
        params: &RequestParams,
        signature: Signature,
    ) -> CacheResult<Value> {
        let payload = self.perform(method, params).await?;
        self.insert(
            params.url(),
            CacheEntry::new(kind, signature, payload.clone()),
        );
        Ok(payload)
    }

    fn insert(&self, url: &str, entry: CacheEntry) {
        debug!(url, kind = ?entry.kind(), "storing entry");
        self.store.insert(url.to_owned(), entry);
        self.counters.store();
    }

    // Uncached transport call; failures are logged and passed through.
    async fn perform(&self, method: Method, params: &RequestParams) -> CacheResult<Value> {
        let transport = self.transport();
        match transport.perform(method, params).await {
            Ok(payload) => Ok(payload),
            Err(e) => {
                warn!(
                    url = params.url(),
                    method = %method,
                    status = ?e.status(),
                    error = %e,
                    "transport call failed"
                );
                Err(e.into())
            }
        }
    }

    // ── Expiry & invalidation ────────────────────────────────────────────────

    /// Drops every expired entry and returns how many were removed.
    ///
    /// A no-op in eternal mode.
    pub fn purge_expired(&self) -> usize {
        if self.config.eternal {
            return 0;
        }
        let now = Instant::now();
        let validity = self.config.validity();
        let removed = self.retain(|_, entry| !entry.is_expired(now, validity));
        if removed > 0 {
            trace!(removed, "expired entries swept");
        }
        removed
    }

    /// Drops every entry regardless of kind or mode.
    pub fn clear_all(&self) -> usize {
        let removed = self.store.len();
        self.store.clear();
        self.counters.evict(removed);
        info!(removed, "cache cleared");
        removed
    }

    /// Drops every [`EntryKind::List`] entry, leaving occurrences untouched.
    pub fn clear_lists(&self) -> usize {
        let removed = self.retain(|_, entry| entry.kind() != EntryKind::List);
        debug!(removed, "list entries cleared");
        removed
    }

    /// Drops occurrence entries whose record at `path` has `id_key == id`.
    ///
    /// List entries are never touched.
    pub fn clear_occurrence(&self, id: &Value, path: &NestedPath) -> usize {
        self.purge_expired();
        let lookup = Lookup::new(self.id_key(), id.clone());
        let removed = self.retain(|_, entry| {
            entry.kind() != EntryKind::Occurrence
                || !extract_occurrence(entry.payload(), path).is_some_and(|r| lookup.matches(r))
        });
        debug!(id = %id, path = %path, removed, "occurrence entries cleared");
        removed
    }

    fn retain(&self, mut keep: impl FnMut(&str, &CacheEntry) -> bool) -> usize {
        let before = self.store.len();
        self.store.retain(|url, entry| keep(url.as_str(), &*entry));
        let removed = before.saturating_sub(self.store.len());
        self.counters.evict(removed);
        removed
    }

    fn apply(&self, invalidation: &Invalidation) {
        if invalidation.clear_all {
            self.clear_all();
        }
        if invalidation.clear_lists {
            self.clear_lists();
        }
        if let Some((id, path)) = &invalidation.clear_occurrence {
            self.clear_occurrence(id, path);
        }
    }

    // ── Record lookup ────────────────────────────────────────────────────────

    /// A [`Lookup`] bound to the configured `id_key`.
    pub fn by_id(&self, id: impl Into<Value>) -> Lookup {
        Lookup::new(self.id_key(), id)
    }

    /// Finds a cached record by id. Never calls the transport.
    pub fn find(&self, id: impl Into<Value>) -> CacheResult<Value> {
        self.find_by_key(&self.by_id(id))
    }

    /// Scans live entries for a record matching `lookup`. Never calls the transport.
    ///
    /// List entries are searched record by record; occurrence entries match
    /// when their single record does. When several entries match, which one
    /// wins is unspecified.
    pub fn find_by_key(&self, lookup: &Lookup) -> CacheResult<Value> {
        self.purge_expired();

        let found = self.store.iter().find_map(|item| {
            let entry = item.value();
            let record = match entry.kind() {
                EntryKind::List => extract_list(entry.payload(), lookup.list_nested_path())
                    .and_then(|records| records.iter().find(|r| lookup.matches(r))),
                EntryKind::Occurrence => {
                    extract_occurrence(entry.payload(), lookup.occurrence_nested_path())
                        .filter(|r| lookup.matches(r))
                }
            };
            record.map(|r| (item.key().clone(), r.clone()))
        });

        match found {
            Some((url, record)) => {
                trace!(url = %url, key = lookup.key(), "record found in cache");
                Ok(record)
            }
            None => Err(CacheError::NotFound {
                key: lookup.key().to_owned(),
                value: lookup.value().clone(),
            }),
        }
    }

    /// Finds a record, falling back to fetching the list once.
    ///
    /// After the fetch the lookup is retried; it may still come up empty.
    pub async fn find_or_fetch_via_list(
        &self,
        lookup: &Lookup,
        method: Method,
        params: &RequestParams,
    ) -> CacheResult<Value> {
        match self.find_by_key(lookup) {
            Err(e) if e.is_not_found() => {
                self.read_list(method, params).await?;
                self.find_by_key(lookup)
            }
            other => other,
        }
    }

    /// Finds a record, falling back to fetching it directly.
    ///
    /// The fetched payload is returned as-is.
    pub async fn find_or_fetch_via_get(
        &self,
        lookup: &Lookup,
        method: Method,
        params: &RequestParams,
    ) -> CacheResult<Value> {
        match self.find_by_key(lookup) {
            Err(e) if e.is_not_found() => self.read_occurrence(method, params).await,
            other => other,
        }
    }

    /// Finds a record, falling back to a cached fetch stored under `kind`.
    pub async fn find_or_fetch(
        &self,
        lookup: &Lookup,
        kind: EntryKind,
        method: Method,
        params: &RequestParams,
    ) -> CacheResult<Value> {
        match self.find_by_key(lookup) {
            Err(e) if e.is_not_found() => self.cached_read(kind, method, params).await,
            other => other,
        }
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    /// Performs an uncached call that creates a record. On success every list
    /// entry is dropped.
    pub async fn create(&self, method: Method, params: &RequestParams) -> CacheResult<Value> {
        let payload = self.perform(method, params).await?;
        self.clear_lists();
        Ok(payload)
    }

    /// Performs an uncached call that modifies record `id`. On success the
    /// matching occurrence entries and every list entry are dropped.
    pub async fn update(
        &self,
        id: impl Into<Value>,
        method: Method,
        params: &RequestParams,
        occurrence_path: &NestedPath,
    ) -> CacheResult<Value> {
        let id = id.into();
        let payload = self.perform(method, params).await?;
        self.clear_occurrence(&id, occurrence_path);
        self.clear_lists();
        Ok(payload)
    }

    /// Performs an uncached call, then applies `invalidation` on success.
    pub async fn generic_request(
        &self,
        method: Method,
        params: &RequestParams,
        invalidation: &Invalidation,
    ) -> CacheResult<Value> {
        let payload = self.perform(method, params).await?;
        self.apply(invalidation);
        Ok(payload)
    }

    /// Like [`generic_request`](Self::generic_request) but goes through the
    /// cached read path, storing a miss under `kind`.
    pub async fn generic_cached_request(
        &self,
        kind: EntryKind,
        method: Method,
        params: &RequestParams,
        invalidation: &Invalidation,
    ) -> CacheResult<Value> {
        let payload = self.cached_read(kind, method, params).await?;
        self.apply(invalidation);
        Ok(payload)
    }

    // ── Inspection ───────────────────────────────────────────────────────────

    /// Number of stored entries, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns `true` if a live entry exists for `url`.
    pub fn contains(&self, url: &str) -> bool {
        self.entry(url).is_some()
    }

    /// Returns a copy of the live entry for `url`, if any.
    pub fn entry(&self, url: &str) -> Option<CacheEntry> {
        let now = Instant::now();
        self.store
            .get(url)
            .filter(|e| self.config.eternal || !e.is_expired(now, self.config.validity()))
            .map(|e| e.value().clone())
    }
}
