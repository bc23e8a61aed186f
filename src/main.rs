use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinematch_api::{
    api::{create_router, AppState},
    cache::{create_redis_client, Cache},
    config::Config,
    services::{providers::TmdbProvider, Dataset, KBounds, PosterService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinematch_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let dataset = Dataset::load(&config.catalog_path, &config.embeddings_path)?;

    let (cache, cache_handle) = match &config.redis_url {
        Some(redis_url) => {
            let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
            tracing::info!("Poster cache enabled");
            (Some(cache), Some(handle))
        }
        None => {
            tracing::info!("REDIS_URL not set, poster cache disabled");
            (None, None)
        }
    };

    let poster_timeout = Duration::from_millis(config.poster_timeout_ms);
    let provider = TmdbProvider::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.poster_base_url.clone(),
        poster_timeout,
        cache,
    )?;
    let posters = PosterService::new(
        Arc::new(provider),
        poster_timeout,
        config.poster_placeholder_url.clone(),
    );

    let k_bounds = KBounds {
        default: config.default_k,
        max: config.max_k,
    };
    let state = AppState::new(dataset, posters, k_bounds);

    if config.prewarm_similarity {
        state.similarity.matrix().await?;
    }

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_handle {
        handle.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
