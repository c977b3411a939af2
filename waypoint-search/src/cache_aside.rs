use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use waypoint_core::repository::ResultCache;
use waypoint_core::CoreResult;

/// Deterministic cache key: `kind:part:part:...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(kind: &str) -> Self {
        Self(kind.to_string())
    }

    pub fn part(mut self, value: impl fmt::Display) -> Self {
        self.0.push(':');
        self.0.push_str(&value.to_string());
        self
    }

    /// Optional parameter, rendered as `absent` when missing.
    pub fn opt_part<T: fmt::Display>(self, value: Option<T>, absent: &str) -> Self {
        match value {
            Some(v) => self.part(v),
            None => self.part(absent),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value plus whether it came from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub cached: bool,
}

/// Check-cache / fetch / populate in one place. Cache failures never fail
/// the caller: a broken read is a miss and a broken write is skipped.
#[derive(Clone)]
pub struct CacheAside {
    cache: Arc<dyn ResultCache>,
}

impl CacheAside {
    pub fn new(cache: Arc<dyn ResultCache>) -> Self {
        Self { cache }
    }

    pub async fn lookup<T: DeserializeOwned>(&self, key: &Fingerprint) -> Option<T> {
        let bytes = match self.cache.get(key.as_str()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cached payload undecodable, treating as miss");
                None
            }
        }
    }

    pub async fn store<T: Serialize>(&self, key: &Fingerprint, value: &T, ttl_seconds: u64) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "Result not serializable, skipping cache write");
                return;
            }
        };

        if let Err(e) = self.cache.set(key.as_str(), &bytes, ttl_seconds).await {
            warn!(key = %key, error = %e, "Cache write failed, skipping");
        }
    }

    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &Fingerprint,
        ttl_seconds: u64,
        fetch: F,
    ) -> CoreResult<Cached<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CoreResult<T>>,
    {
        if let Some(value) = self.lookup(key).await {
            return Ok(Cached { value, cached: true });
        }

        let value = fetch().await?;
        self.store(key, &value, ttl_seconds).await;
        Ok(Cached { value, cached: false })
    }
}
