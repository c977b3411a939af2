use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;
use waypoint_core::repository::ResultCache;
use waypoint_core::{CoreError, CoreResult};

/// Redis-backed result cache. The multiplexed connection is opened once and
/// cloned per command.
#[derive(Clone)]
pub struct RedisClient {
    conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Redis client connected");
        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

fn cache_error(e: redis::RedisError) -> CoreError {
    CoreError::StoreUnavailable(format!("redis: {}", e))
}

#[async_trait]
impl ResultCache for RedisClient {
    async fn get(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(cache_error)
    }

    async fn set(&self, key: &str, value: &[u8], ttl_seconds: u64) -> CoreResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cache_error)
    }
}
