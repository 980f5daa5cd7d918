use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use trainingx_backend::adaptive::config::AdaptiveConfig;
use trainingx_backend::adaptive::AdaptiveEngine;
use trainingx_backend::config::Config;
use trainingx_backend::logging::{init_tracing, LogConfig};
use trainingx_backend::matching::catalog::Catalog;
use trainingx_backend::middleware::rate_limit::rate_limit_cleanup_loop;
use trainingx_backend::middleware::request_id::REQUEST_ID_HEADER;
use trainingx_backend::routes::build_router;
use trainingx_backend::services::coach::CareerCoach;
use trainingx_backend::state::AppState;
use trainingx_backend::store::Store;

const HSTS_HEADER: &str = "max-age=31536000; includeSubDomains";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(&LogConfig::from(&config));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting trainingx-backend");

    if let Err(e) = CareerCoach::validate_config(&config.coach) {
        panic!("Invalid coach configuration: {e}");
    }

    let adaptive_config = AdaptiveConfig::from_env(&config.adaptive);
    if let Err(e) = adaptive_config.validate() {
        panic!("Invalid adaptive configuration: {e}");
    }

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::from_path(path),
        None => Catalog::bundled(),
    }
    .unwrap_or_else(|e| panic!("Failed to load opportunity catalog: {e}"));
    tracing::info!(opportunities = catalog.len(), "Catalog loaded");

    let store = Arc::new(
        Store::open(&config.sled_path)
            .unwrap_or_else(|e| panic!("Failed to open sled database: {e}")),
    );
    if let Err(e) = store.run_migrations() {
        panic!("Failed to run migrations: {e}");
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let adaptive = Arc::new(AdaptiveEngine::new(adaptive_config, store.clone()));
    let state = AppState::new(
        store.clone(),
        adaptive,
        Arc::new(catalog),
        &config,
        shutdown_tx.clone(),
    );

    tokio::spawn(rate_limit_cleanup_loop(
        state.rate_limit().clone(),
        shutdown_tx.subscribe(),
    ));

    let app = build_router(state)
        .layer(build_cors_layer(&config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static(HSTS_HEADER),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {addr}: {e}"));

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()));

    if let Err(e) = server.await {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    tracing::info!("Shutdown complete");
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let allowed_headers = [
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static(REQUEST_ID_HEADER),
    ];

    // Wildcard is for local development only and never sends credentials.
    if config.cors_origin.trim() == "*" {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_credentials(false)
            .allow_headers(allowed_headers)
            .allow_methods(Any);
    }

    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_headers(allowed_headers)
            .allow_methods(Any),
        Err(e) => panic!(
            "Invalid CORS_ORIGIN '{}': {}. Fix the CORS_ORIGIN environment variable.",
            config.cors_origin, e
        ),
    }
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
