use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod registry;
mod server;
mod ws;

use sage_agent::RagAgent;
use sage_config::Config;
use sage_llm::{GeneratorConfig, OpenAiGenerator};
use sage_quota::{MemoryQuotaStore, QuotaStore, QuotaTracker, RedisQuotaStore};
use sage_retrieval::{HttpRetriever, RetrieverConfig};

use registry::SessionRegistry;
use server::{run_server, AppState};

#[derive(Parser, Debug)]
#[command(name = "sage-server")]
#[command(about = "Sage - real-time RAG chat gateway")]
#[command(version)]
struct Cli {
    /// Server port (overrides SAGE_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Redis URL for quota counters shared across instances
    /// (overrides SAGE_REDIS_URL)
    #[arg(long)]
    redis_url: Option<String>,

    /// Retrieval backend base URL (overrides SAGE_RETRIEVAL_URL)
    #[arg(long)]
    retrieval_url: Option<String>,

    /// Generation backend base URL (overrides SAGE_LLM_URL)
    #[arg(long)]
    llm_url: Option<String>,

    /// Generation model name (overrides SAGE_LLM_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Log filter, e.g. "info" or "sage_server=debug"
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.redis_url.is_some() {
        config.quota.redis_url = cli.redis_url;
    }
    if let Some(url) = cli.retrieval_url {
        config.retrieval.base_url = url;
    }
    if let Some(url) = cli.llm_url {
        config.generation.base_url = url;
    }
    if let Some(model) = cli.model {
        config.generation.model = model;
    }

    info!("Starting sage gateway");
    info!("  Listen: {}:{}", config.server.host, config.server.port);
    info!(
        "  Quota: {} requests / {}s window, {}s cooldown",
        config.quota.limit, config.quota.window_secs, config.quota.cooldown_secs
    );
    info!("  Retrieval: {}", config.retrieval.base_url);
    info!(
        "  Generation: {} ({})",
        config.generation.base_url, config.generation.model
    );

    // Quota counters: Redis when configured (shared across gateway
    // instances), otherwise an in-process store. Redis being down at boot
    // follows the same fail-open policy as at admit time.
    let quota_store: Arc<dyn QuotaStore> = match config.quota.redis_url.as_deref() {
        Some(url) => match RedisQuotaStore::connect(url).await {
            Ok(store) => {
                info!("quota counters shared via redis");
                Arc::new(store)
            }
            Err(e) => {
                warn!(error = %e, "redis unreachable, using in-process quota counters");
                Arc::new(MemoryQuotaStore::new())
            }
        },
        None => Arc::new(MemoryQuotaStore::new()),
    };
    let quota = QuotaTracker::new(
        quota_store,
        config.quota.limit,
        Duration::from_secs(config.quota.window_secs),
    );

    let mut retriever_config = RetrieverConfig::new(config.retrieval.base_url.clone())
        .with_namespace(config.retrieval.namespace.clone())
        .with_timeout(Duration::from_secs(config.retrieval.timeout_secs));
    if let Some(key) = config.retrieval.api_key.clone() {
        retriever_config = retriever_config.with_api_key(key);
    }
    let retriever = Arc::new(HttpRetriever::new(retriever_config)?);

    let mut generator_config = GeneratorConfig::new(
        config.generation.base_url.clone(),
        config.generation.model.clone(),
    )
    .with_timeout(Duration::from_secs(config.generation.timeout_secs));
    if let Some(key) = config.generation.api_key.clone() {
        generator_config = generator_config.with_api_key(key);
    }
    let generator = Arc::new(OpenAiGenerator::new(generator_config)?);

    let agent = RagAgent::new(retriever, generator, config.generation.max_history_turns);

    let state = AppState {
        registry: SessionRegistry::new(),
        quota,
        agent,
        cooldown: Duration::from_secs(config.quota.cooldown_secs),
    };

    run_server(&config.server, state).await
}
