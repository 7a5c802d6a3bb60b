use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::store::QuotaStore;

/// Fixed-window request counter with fail-open admission.
///
/// Each admission check increments the identity's counter for the current
/// window; once the post-increment count passes the limit the request is
/// denied. Denied attempts still count - the window is never reset early.
pub struct QuotaTracker {
    store: Arc<dyn QuotaStore>,
    limit: u64,
    window: Duration,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn QuotaStore>, limit: u64, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    /// Whether a request from `identity` may proceed.
    ///
    /// If the counter store is unreachable the tracker admits the request
    /// and logs the fault: chat availability wins over strict quota
    /// accuracy.
    pub async fn admit(&self, identity: &str) -> bool {
        let key = format!("rate_limit:{}", identity);
        match self.store.incr_with_expiry(&key, self.window).await {
            Ok(count) => count <= self.limit,
            Err(e) => {
                warn!(identity, error = %e, "quota store unavailable, admitting request");
                true
            }
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuotaStoreError;
    use crate::memory::MemoryQuotaStore;
    use async_trait::async_trait;

    struct UnreachableStore;

    #[async_trait]
    impl QuotaStore for UnreachableStore {
        async fn incr_with_expiry(
            &self,
            _key: &str,
            _window: Duration,
        ) -> Result<u64, QuotaStoreError> {
            Err(QuotaStoreError::Connection("refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_admits_up_to_limit_then_denies() {
        let tracker = QuotaTracker::new(
            Arc::new(MemoryQuotaStore::new()),
            5,
            Duration::from_secs(20),
        );

        for _ in 0..5 {
            assert!(tracker.admit("client-7").await);
        }
        assert!(!tracker.admit("client-7").await);
        // Still denied: the failed attempt did not reset the window
        assert!(!tracker.admit("client-7").await);
    }

    #[tokio::test]
    async fn test_window_expiry_readmits() {
        let tracker = QuotaTracker::new(
            Arc::new(MemoryQuotaStore::new()),
            2,
            Duration::from_millis(50),
        );

        assert!(tracker.admit("client-7").await);
        assert!(tracker.admit("client-7").await);
        assert!(!tracker.admit("client-7").await);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(tracker.admit("client-7").await);
    }

    #[tokio::test]
    async fn test_identities_throttled_independently() {
        let tracker = QuotaTracker::new(
            Arc::new(MemoryQuotaStore::new()),
            1,
            Duration::from_secs(20),
        );

        assert!(tracker.admit("a").await);
        assert!(!tracker.admit("a").await);
        assert!(tracker.admit("b").await);
    }

    #[tokio::test]
    async fn test_fails_open_when_store_unreachable() {
        let tracker = QuotaTracker::new(Arc::new(UnreachableStore), 1, Duration::from_secs(20));

        for _ in 0..10 {
            assert!(tracker.admit("client-7").await);
        }
    }
}
