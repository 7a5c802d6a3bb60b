//! Sage retrieval - similarity-search client for the context store.
//!
//! The store itself is an external service; this crate only speaks its
//! query interface: text in, ranked passages out.

mod client;
mod error;

pub use client::{HttpRetriever, RetrieverConfig};
pub use error::RetrievalError;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, RetrievalError>;

/// A passage returned by the retrieval store, ranked by relevance.
///
/// The score is opaque to the gateway; it only matters for the store's own
/// top-k ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub score: f32,
}

/// Query interface to the retrieval store.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return passages relevant to `query`, best match first.
    async fn query(&self, query: &str) -> Result<Vec<RetrievalResult>>;
}
