//! Regression Predictor Server
//!
//! Serves a fitted regression model over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    PREDICTOR SERVER                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌───────────┐    ┌───────────────────────────────────┐  │
//! │  │  Router   │───►│  ModelContext (Arc, read-only)    │  │
//! │  │  (Axum)   │    │  normalize ─► scale ─► predict    │  │
//! │  └───────────┘    └─────────────────▲─────────────────┘  │
//! │                                     │                    │
//! │                     artifacts (JSON, loaded once)        │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::map_response,
    routing::{get, post},
};
use predictor_core::{load_context, ModelContext};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "predictor_server=debug,predictor_core=info,tower_http=debug".into()));
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Predictor server starting...");

    // Load artifacts
    let context = load_context(&config.artifact_paths())
        .context("Failed to load model artifacts")?;

    tracing::info!(
        model = context.predictor_name(),
        scaler = context.has_scaler(),
        features = ?context.schema().names(),
        "Model artifacts loaded"
    );

    // Build application state
    let state = AppState {
        context: Arc::new(context),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ModelContext>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(handlers::health::check))
        .route("/health", get(handlers::health::check))
        .route("/api/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .fallback(handlers::not_found);

    with_http_layers(routes, &state.config).with_state(state)
}

/// Body limit, timeout, JSON error rewriting, compression, tracing and CORS
fn with_http_layers(routes: Router<AppState>, config: &config::Config) -> Router<AppState> {
    routes
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(map_response(handlers::json_errors))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
