use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};

use crate::error::QuotaStoreError;
use crate::store::QuotaStore;

/// Lua body for increment-with-expiry. Runs server-side so the increment
/// and the first-window expiry land in one atomic round trip.
const INCR_WITH_EXPIRY: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// Redis-backed quota store, for quota shared across gateway instances.
pub struct RedisQuotaStore {
    conn: ConnectionManager,
    script: Script,
}

impl RedisQuotaStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1`).
    pub async fn connect(url: &str) -> Result<Self, QuotaStoreError> {
        let client =
            Client::open(url).map_err(|e| QuotaStoreError::Connection(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| QuotaStoreError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            script: Script::new(INCR_WITH_EXPIRY),
        })
    }
}

impl From<redis::RedisError> for QuotaStoreError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
            QuotaStoreError::Connection(e.to_string())
        } else {
            QuotaStoreError::Command(e.to_string())
        }
    }
}

#[async_trait]
impl QuotaStore for RedisQuotaStore {
    async fn incr_with_expiry(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<u64, QuotaStoreError> {
        let mut conn = self.conn.clone();
        let count: u64 = self
            .script
            .key(key)
            .arg(window.as_secs())
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }
}
