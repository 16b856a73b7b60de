//! Cache configuration: typed settings with layered precedence (file → env).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_ID_KEY: &str = "id";
const DEFAULT_VALIDITY_SECS: u64 = 60;
const ENV_PREFIX: &str = "REQCACHE";

/// Errors raised while loading [`CacheConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
}

/// Settings for a [`RequestCache`](crate::cache::RequestCache).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Field naming a record's primary key inside list and occurrence payloads.
    pub id_key: String,
    /// When set, entries never expire by time; only explicit invalidation removes them.
    pub eternal: bool,
    /// How long an entry stays fresh, in seconds.
    pub validity_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            id_key: DEFAULT_ID_KEY.to_owned(),
            eternal: false,
            validity_secs: DEFAULT_VALIDITY_SECS,
        }
    }
}

impl CacheConfig {
    /// Creates the default configuration keyed on `id_key`.
    pub fn new(id_key: impl Into<String>) -> Self {
        Self {
            id_key: id_key.into(),
            ..Self::default()
        }
    }

    /// Loads settings from an optional file, then `REQCACHE_*` environment variables.
    ///
    /// Missing keys fall back to [`CacheConfig::default`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Builder-style toggle for eternal mode.
    #[must_use]
    pub fn eternal(mut self, eternal: bool) -> Self {
        self.eternal = eternal;
        self
    }

    /// Builder-style setter for the validity window.
    #[must_use]
    pub fn validity_secs(mut self, secs: u64) -> Self {
        self.validity_secs = secs;
        self
    }

    /// Returns the validity window as a [`Duration`].
    pub fn validity(&self) -> Duration {
        Duration::from_secs(self.validity_secs)
    }
}
