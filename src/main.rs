use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vnrec_api::db::{create_pool, create_redis_client, RecommendationCache};
use vnrec_api::services::{EngineConfig, HttpPreferenceExtractor, RecommendationEngine};
use vnrec_api::store::PgCandidateStore;
use vnrec_api::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, writer_handle, receipts) = RecommendationCache::new(
        redis_client,
        pool.clone(),
        config.hot_cache_ttl_secs,
        config.precomputed_freshness_hours,
    );
    // Receipts are for tests; the writer tolerates the closed channel.
    drop(receipts);

    let store = Arc::new(PgCandidateStore::new(pool));
    let extractor = Arc::new(HttpPreferenceExtractor::new(config.analytics_url.clone()));
    let engine = Arc::new(RecommendationEngine::new(
        store,
        extractor,
        cache,
        EngineConfig::default(),
    ));

    let app = create_router(AppState { engine });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    writer_handle.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
    }
    tracing::info!("Shutdown signal received");
}
