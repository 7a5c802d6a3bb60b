//! Sage quota - fixed-window admission control shared across gateway
//! instances.
//!
//! The tracker counts requests per client identity inside discrete windows
//! and denies anything past the configured limit. Counters live behind the
//! [`QuotaStore`] trait: Redis for deployments where several gateway
//! processes share quota, an in-process map for single instances and tests.

mod error;
mod memory;
mod redis_store;
mod store;
mod tracker;

pub use error::QuotaStoreError;
pub use memory::MemoryQuotaStore;
pub use redis_store::RedisQuotaStore;
pub use store::QuotaStore;
pub use tracker::QuotaTracker;
