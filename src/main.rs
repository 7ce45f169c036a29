//! Coverage Explorer API server
//!
//! Serves hotspot, wallet, validator, block, transaction and network stats
//! views over the ledger database, caching every answer in memcached.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    ServiceExt,
};
use tower::Layer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    normalize_path::NormalizePathLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coverage_explorer::{
    app_state::AppState,
    cache::{Cache, CacheStore, MemcachedStore, MemoryStore},
    config::{CacheBackend, Config},
    db, routes,
    services::{LedgerContext, PriceFeed},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let pool = db::connect(&config)
        .await
        .context("failed to connect to the ledger database")?;

    let cache = Cache::new(build_cache_store(&config).await);
    if config.clear_cache_on_start {
        match cache.clear_all().await {
            Ok(()) => info!("cache flushed at startup"),
            Err(e) => warn!(error = %e, "startup cache flush failed"),
        }
    }

    let price_feed = PriceFeed::new(config.price_feed_url.clone(), cache.clone())?;
    let state = AppState::new(LedgerContext::new(pool, cache), price_feed);

    let router = routes::api_router(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(build_cors_layer(&config))
        .layer(TraceLayer::new_for_http());
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);

    let addr = SocketAddr::new(config.bind_addr, config.port);
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .await
        .context("server error")?;

    Ok(())
}

async fn build_cache_store(config: &Config) -> Arc<dyn CacheStore> {
    match config.cache_backend {
        CacheBackend::Memcached => {
            let store = MemcachedStore::new(config.memcached_addr.clone(), config.cache_io_timeout);
            match store.ping().await {
                Ok(version) => info!(addr = %config.memcached_addr, %version, "memcached reachable"),
                // Requests still work; every lookup degrades to a miss.
                Err(e) => warn!(addr = %config.memcached_addr, error = %e, "memcached unreachable"),
            }
            Arc::new(store)
        }
        CacheBackend::Memory => {
            info!(capacity = %config.memory_cache_capacity, "using in-process cache");
            Arc::new(MemoryStore::with_capacity(config.memory_cache_capacity))
        }
    }
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let origins = if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            config
                .cors_allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(false)
}
