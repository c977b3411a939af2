use async_trait::async_trait;

use crate::iata::LocationCode;
use crate::location::Location;
use crate::CoreResult;

/// Durable table of resolved locations keyed by code.
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn get(&self, code: &LocationCode) -> CoreResult<Option<Location>>;

    /// Insert-or-update keyed by `code`; the incoming row wins on conflict.
    async fn upsert(&self, location: &Location) -> CoreResult<()>;
}

/// Time-bounded key/value cache for serialized query results.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> CoreResult<()>;
}
