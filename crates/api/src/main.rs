//! Herald API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_common::db::{create_pool, run_migrations};
use herald_common::redis_pool::create_redis_pool;
use herald_engine::queue::RedisDispatchQueue;
use herald_engine::store::PgRecordStore;

use herald_api::routes::create_router;
use herald_api::state::AppState;

/// Requests larger than this are rejected before parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("herald_api=debug,herald_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Herald API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    // Create Redis connection
    let redis = create_redis_pool(&config.redis_url).await?;
    tracing::info!(queue = %config.dispatch_queue_key, "Dispatch queue ready");

    // Build application state
    let state = AppState::new(
        Arc::new(PgRecordStore::new(pool)),
        Arc::new(RedisDispatchQueue::new(redis, config.dispatch_queue_key.clone())),
    );

    // Build router
    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    Ok(())
}
