//! In-process implementations of the store and cache contracts, used when
//! Postgres or Redis are not configured and as test doubles.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use waypoint_core::repository::{LocationStore, ResultCache};
use waypoint_core::{CoreResult, Location, LocationCode};

/// Longest lifetime an entry is given, whatever TTL the caller asks for.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// TTL cache bounded to `max_entries`. When full, expired entries are purged
/// first, then the entry closest to expiry is evicted.
pub struct MemoryResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl MemoryResultCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryResultCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                debug!(key, "Cache entry expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> CoreResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_entries && !entries.contains_key(key) {
            entries.retain(|_, e| !e.is_expired(now));

            if entries.len() >= self.max_entries {
                let victim = entries
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(victim) = victim {
                    entries.remove(&victim);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_vec(),
                expires_at: now + Duration::from_secs(ttl_seconds).min(MAX_TTL),
            },
        );
        Ok(())
    }
}

/// Location table held in a map; rows live for the life of the process.
#[derive(Default)]
pub struct MemoryLocationStore {
    rows: RwLock<HashMap<LocationCode, Location>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn get(&self, code: &LocationCode) -> CoreResult<Option<Location>> {
        Ok(self.rows.read().await.get(code).cloned())
    }

    async fn upsert(&self, location: &Location) -> CoreResult<()> {
        self.rows
            .write()
            .await
            .insert(location.code.clone(), location.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use waypoint_core::LocationKind;

    #[tokio::test(start_paused = true)]
    async fn test_get_within_ttl_then_expire() {
        let cache = MemoryResultCache::new(16);
        let payload = br#"{"flights":[{"id":"1","price":412.3}],"nested":{"a":[1,2,3]}}"#;

        cache.set("flights:JFK:LHR", payload, 900).await.unwrap();
        tokio::time::advance(Duration::from_secs(899)).await;
        assert_eq!(cache.get("flights:JFK:LHR").await.unwrap().as_deref(), Some(&payload[..]));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("flights:JFK:LHR").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_is_capped() {
        let cache = MemoryResultCache::new(16);
        cache.set("forever", b"v", u64::MAX).await.unwrap();
        assert_eq!(cache.get("forever").await.unwrap().as_deref(), Some(&b"v"[..]));

        tokio::time::advance(MAX_TTL + Duration::from_secs(1)).await;
        assert!(cache.get("forever").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_ttl() {
        let cache = MemoryResultCache::new(16);
        cache.set("k", b"old", 10).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k", b"new", 10).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some(&b"new"[..]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicts_soonest_expiring_when_full() {
        let cache = MemoryResultCache::new(2);
        cache.set("short", b"1", 10).await.unwrap();
        cache.set("long", b"2", 1000).await.unwrap();
        cache.set("newest", b"3", 500).await.unwrap();

        assert!(cache.get("short").await.unwrap().is_none());
        assert!(cache.get("long").await.unwrap().is_some());
        assert!(cache.get("newest").await.unwrap().is_some());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_location_upsert_replaces_row() {
        let store = MemoryLocationStore::new();
        let code = LocationCode::parse("LHR").unwrap();
        let mut location = Location {
            code: code.clone(),
            name: "HEATHROW".to_string(),
            city: Some("LONDON".to_string()),
            country: None,
            country_code: Some("GB".to_string()),
            latitude: 51.47,
            longitude: -0.45,
            kind: LocationKind::Airport,
            updated_at: Utc::now(),
        };
        store.upsert(&location).await.unwrap();

        location.name = "LONDON HEATHROW".to_string();
        store.upsert(&location).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(&code).await.unwrap().unwrap().name, "LONDON HEATHROW");
    }
}
