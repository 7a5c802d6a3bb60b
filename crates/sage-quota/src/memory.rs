use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::QuotaStoreError;
use crate::store::QuotaStore;

#[derive(Debug)]
struct WindowSlot {
    count: u64,
    expires_at: Instant,
}

/// In-process quota store for single-instance deployments and tests.
///
/// Counters live in a concurrent map; the entry lock makes each
/// increment atomic. Expired slots reset lazily on the next increment.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    windows: DashMap<String, WindowSlot>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn incr_with_expiry(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<u64, QuotaStoreError> {
        let now = Instant::now();
        let mut slot = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowSlot {
                count: 0,
                expires_at: now + window,
            });

        if slot.expires_at <= now {
            slot.count = 0;
            slot.expires_at = now + window;
        }
        slot.count += 1;
        Ok(slot.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_within_window() {
        let store = MemoryQuotaStore::new();
        let window = Duration::from_secs(20);

        for expected in 1..=3 {
            let count = store.incr_with_expiry("client-1", window).await.unwrap();
            assert_eq!(count, expected);
        }
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let store = MemoryQuotaStore::new();
        let window = Duration::from_secs(20);

        store.incr_with_expiry("client-1", window).await.unwrap();
        store.incr_with_expiry("client-1", window).await.unwrap();
        let other = store.incr_with_expiry("client-2", window).await.unwrap();
        assert_eq!(other, 1);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_counter() {
        let store = MemoryQuotaStore::new();
        let window = Duration::from_millis(50);

        store.incr_with_expiry("client-1", window).await.unwrap();
        store.incr_with_expiry("client-1", window).await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;

        let count = store.incr_with_expiry("client-1", window).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_unique() {
        use std::sync::Arc;

        let store = Arc::new(MemoryQuotaStore::new());
        let window = Duration::from_secs(20);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.incr_with_expiry("shared", window).await.unwrap()
            }));
        }

        let mut counts = Vec::new();
        for handle in handles {
            counts.push(handle.await.unwrap());
        }
        counts.sort_unstable();
        assert_eq!(counts, (1..=16).collect::<Vec<u64>>());
    }
}
