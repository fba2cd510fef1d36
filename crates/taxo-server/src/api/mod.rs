pub mod response;

use crate::config::{Config, CorsConfig, SourceConfig, SourceKind};
use crate::features::{self, shared::method_not_allowed, FeatureState};
use crate::middleware;
use crate::taxonomy::{InMemoryTaxonomy, SqliteTaxonomy, TaxonomySource};
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Open the configured taxonomy backend
pub async fn open_source(config: &SourceConfig) -> anyhow::Result<Arc<dyn TaxonomySource>> {
    match config.kind {
        SourceKind::Sqlite => {
            let source = SqliteTaxonomy::connect(&config.sqlite())
                .await
                .with_context(|| {
                    format!(
                        "Failed to open taxonomy database {}",
                        config.database_path.display()
                    )
                })?;
            Ok(Arc::new(source))
        },
        SourceKind::Taxdump => {
            let dir = config
                .taxdump_dir
                .clone()
                .context("No taxdump directory configured")?;
            let source = tokio::task::spawn_blocking(move || InMemoryTaxonomy::from_taxdump(&dir))
                .await
                .context("Taxdump loader task failed")??;
            tracing::info!(taxa = source.index().len(), "Taxdump loaded into memory");
            Ok(Arc::new(source))
        },
    }
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let source = open_source(&config.source).await?;
    let state = FeatureState::new(source);
    let app = create_router(state, &config.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState, cors: &CorsConfig) -> Router {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .merge(features::router())
        .fallback(not_found)
        .with_state(state)
        // Apply layers from innermost to outermost
        .layer(middleware::catch_panic_layer())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

async fn health(State(state): State<FeatureState>) -> Response {
    let kind = state.source.kind();
    match state.source.acquire().await {
        Ok(_handle) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "source": kind
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Taxonomy source health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "source": kind
                })),
            )
                .into_response()
        },
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    tracing::info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
