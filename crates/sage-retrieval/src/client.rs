use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RetrievalError;
use crate::{RetrievalResult, Retriever, Result};

/// Retrieval client configuration
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Base URL of the vector-search service
    pub base_url: String,
    /// Optional API key sent as `Api-Key`
    pub api_key: Option<String>,
    /// Namespace within the store to search
    pub namespace: String,
    /// Request timeout
    pub timeout: Duration,
    /// Number of ranked results to ask for
    pub top_k: usize,
}

impl RetrieverConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            namespace: "default".to_string(),
            timeout: Duration::from_secs(30),
            top_k: 1,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    namespace: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    text: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    matches: Vec<QueryMatch>,
}

/// HTTP client for the retrieval store's query endpoint.
pub struct HttpRetriever {
    config: RetrieverConfig,
    http_client: reqwest::Client,
}

impl HttpRetriever {
    pub fn new(config: RetrieverConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RetrievalError::Config(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn build_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(ref key) = self.config.api_key {
            headers.insert(
                "Api-Key",
                header::HeaderValue::from_str(key)
                    .map_err(|e| RetrievalError::Config(format!("invalid api key: {}", e)))?,
            );
        }
        Ok(headers)
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn query(&self, query: &str) -> Result<Vec<RetrievalResult>> {
        let url = format!("{}/query", self.config.base_url);
        let body = QueryRequest {
            query,
            namespace: &self.config.namespace,
            top_k: self.config.top_k,
        };

        let response = self
            .http_client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        debug!(count = parsed.matches.len(), "retrieval query returned");

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| RetrievalResult {
                text: m.text,
                score: m.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_response_parsing() {
        let raw = r#"{"matches": [{"text": "graduated in 2023", "score": 0.91}]}"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.matches.len(), 1);
        assert_eq!(parsed.matches[0].text, "graduated in 2023");
    }

    #[test]
    fn test_query_response_missing_score_defaults() {
        let raw = r#"{"matches": [{"text": "passage"}]}"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.matches[0].score, 0.0);
    }

    #[test]
    fn test_config_builder() {
        let config = RetrieverConfig::new("http://localhost:6333")
            .with_api_key("secret")
            .with_namespace("personal");
        assert_eq!(config.namespace, "personal");
        assert_eq!(config.top_k, 1);
    }
}
