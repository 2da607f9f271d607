use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use combot_api::{app::build_router, config::Config, memory::MemoryMonitor, state::AppState};
use combot_llm::{ChatClient, OpenAIClient};
use combot_ml::{CacheStore, HttpModelLoader, MemoryStore, MlService, MlSettings};
use combot_persist::{ConversationStore, InMemoryConversationStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Combot API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    let llm_client: Arc<dyn ChatClient> = Arc::new(OpenAIClient::with_timeout(
        config.openai_api_key.clone(),
        Duration::from_secs(config.llm.timeout_secs),
    )?);

    let cache_store = connect_cache(&config).await?;
    let store = connect_store(&config).await?;

    let loader = HttpModelLoader::new(
        config.ml.endpoint.clone(),
        config.hf_api_token.as_deref(),
        Duration::from_secs(config.ml.request_timeout_secs),
    )?;
    let ml = Arc::new(MlService::new(
        MlSettings::from(&config.ml),
        Arc::new(loader),
        cache_store.clone(),
    ));
    let _cleanup = ml.spawn_cleanup_task();
    tracing::info!(model = %config.ml.model_name, "Classifier service ready");

    let memory = MemoryMonitor::new(config.memory.clone());
    let state = Arc::new(AppState::new(
        config.clone(),
        llm_client,
        ml,
        store,
        cache_store,
        memory,
    ));

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Redis when `REDIS_URL` is set (and the feature is on), else in-process
async fn connect_cache(config: &Config) -> anyhow::Result<Arc<dyn CacheStore>> {
    #[cfg(feature = "redis")]
    if let Some(url) = &config.redis_url {
        tracing::info!("Connecting to Redis");
        let store = combot_ml::RedisStore::connect(url).await?;
        tracing::info!("Redis connected");
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "redis"))]
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL is set but the redis feature is disabled");
    }

    tracing::info!("Using in-process cache");
    Ok(Arc::new(MemoryStore::new()))
}

/// MongoDB when `MONGODB_URI` is set (and the feature is on), else in-memory
async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn ConversationStore>> {
    #[cfg(feature = "mongodb")]
    if let Some(uri) = &config.mongodb_uri {
        tracing::info!("Connecting to MongoDB");
        let store = combot_persist::MongoConversationStore::connect(uri, &config.mongodb.database).await?;
        tracing::info!("MongoDB connected");
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "mongodb"))]
    if config.mongodb_uri.is_some() {
        tracing::warn!("MONGODB_URI is set but the mongodb feature is disabled");
    }

    tracing::warn!("No database configured, conversations are kept in memory only");
    Ok(Arc::new(InMemoryConversationStore::new()))
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
