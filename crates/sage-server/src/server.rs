//! HTTP server - health endpoint, WebSocket upgrade route, CORS.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sage_agent::RagAgent;
use sage_config::ServerConfig;
use sage_quota::QuotaTracker;

use crate::registry::SessionRegistry;
use crate::ws::websocket_handler;

/// Shared application state handed to every connection task
pub struct AppState {
    pub registry: SessionRegistry,
    pub quota: QuotaTracker,
    pub agent: RagAgent,
    /// Pause applied to a connection after a throttling notice
    pub cooldown: Duration,
}

/// Bind and serve until the process is stopped
pub async fn run_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen address: {}", e))?;

    let app = create_router(state, &config.allowed_origins);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("sage gateway listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router: liveness probe plus the per-client WebSocket endpoint
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws/:client_id", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sage_llm::Generator;
    use sage_quota::MemoryQuotaStore;
    use sage_retrieval::{RetrievalResult, Retriever};

    struct StubRetriever;

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn query(&self, _query: &str) -> sage_retrieval::Result<Vec<RetrievalResult>> {
            Ok(vec![RetrievalResult {
                text: "stub".to_string(),
                score: 1.0,
            }])
        }
    }

    struct StubGenerator;

    #[async_trait]
    impl Generator for StubGenerator {
        async fn complete(&self, _prompt: &str) -> sage_llm::Result<String> {
            Ok("stub answer".to_string())
        }
    }

    fn test_state() -> AppState {
        AppState {
            registry: SessionRegistry::new(),
            quota: QuotaTracker::new(
                Arc::new(MemoryQuotaStore::new()),
                5,
                Duration::from_secs(20),
            ),
            agent: RagAgent::new(Arc::new(StubRetriever), Arc::new(StubGenerator), 0),
            cooldown: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_router_builds_with_permissive_cors() {
        let _router = create_router(test_state(), &[]);
    }

    #[tokio::test]
    async fn test_router_builds_with_origin_list() {
        let origins = vec![
            "http://localhost:3000".to_string(),
            "https://example.com".to_string(),
        ];
        let _router = create_router(test_state(), &origins);
    }
}
