//! Ovenside API - file-backed ordering service.
//!
//! Serves the ordering API: accounts, session tokens, the menu, carts,
//! and orders through payment. Records live as JSON files grouped by
//! collection under the data root; there is no database.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::Router;
use tower::Layer;
use tower_http::{
    normalize_path::NormalizePathLayer, services::ServeDir, trace::TraceLayer,
};

use ovenside_api::config::ApiConfig;
use ovenside_api::routes;
use ovenside_api::state::AppState;
use ovenside_api::workers;

#[tokio::main]
async fn main() {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ovenside_api=info,tower_http=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = ApiConfig::from_env().expect("Failed to load configuration");
    let public_dir = config.public_dir.clone();
    let log_rotation = config.log_rotation;

    let state = AppState::bootstrap(config)
        .await
        .expect("Failed to initialize application state");
    tracing::info!(root = %state.store().root().display(), "record store ready");

    workers::spawn_log_rotation(state.errors().clone(), log_rotation);

    let app = Router::new()
        .nest_service("/public", ServeDir::new(public_dir))
        .merge(routes::router(state.clone()))
        .layer(TraceLayer::new_for_http());

    // Trailing-slash normalization has to wrap the whole router.
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);

    let addr = state.config().socket_addr();
    tracing::info!("api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
