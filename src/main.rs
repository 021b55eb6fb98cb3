use std::sync::Arc;

use anyhow::Context;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use bigcache::config::Config;
use bigcache::engine::CacheEngine;
use bigcache::handlers;
use bigcache::request_id::request_id_middleware;
use bigcache::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    bigcache::logging::init();

    let config = Config::from_env().context("loading configuration")?;
    config.log();

    tracing::info!(db_path = %config.db_path, "opening cache store");
    let engine = Arc::new(CacheEngine::open(&config.db_path).context("opening cache store")?);
    let state = AppState::new(engine);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route(
            "/cache/*key",
            post(handlers::set_cache)
                .get(handlers::get_cache)
                .delete(handlers::delete_cache),
        )
        .route("/pickle/*key", post(handlers::set_pickle).get(handlers::get_pickle))
        .route("/prefix/*prefix", delete(handlers::delete_prefix))
        .route("/stat", get(handlers::stats))
        .route("/stat/count", get(handlers::count))
        .route("/clear", get(handlers::clear))
        .route("/close", get(handlers::close))
        .route("/health", get(handlers::health))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("binding to {}", config.addr()))?;

    tracing::info!(addr = %config.addr(), "cache server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
    tracing::info!("shutdown signal received, stopping server");
}
