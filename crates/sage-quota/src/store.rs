use std::time::Duration;

use async_trait::async_trait;

use crate::error::QuotaStoreError;

/// Atomic counter service backing the quota tracker.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Atomically increment the counter for `key` and return the
    /// post-increment count.
    ///
    /// The first increment observed in a fresh window sets the key to
    /// expire after `window`; later increments leave the expiry untouched.
    /// Implementations must not expose a read-then-write race: the count a
    /// caller sees is unique across all concurrent callers of the same key.
    async fn incr_with_expiry(&self, key: &str, window: Duration)
        -> Result<u64, QuotaStoreError>;
}
