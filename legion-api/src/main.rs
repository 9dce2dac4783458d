//! LEGION API Server Entry Point
//!
//! Bootstraps configuration, wires the in-memory service stack, and starts
//! the Axum HTTP server.

use std::net::SocketAddr;

use axum::Router;
use legion_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legion_api=info,tower_http=info".into()),
        )
        .init();

    let config = ApiConfig::from_env();
    let state = AppState::from_config(&config);
    let app: Router = create_api_router(state, &config);

    let addr = resolve_bind_addr(&config)?;
    tracing::info!(%addr, "Starting LEGION API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    let addr = format!("{}:{}", config.bind_host, config.port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
