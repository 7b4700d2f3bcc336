//! OEE Edge Gateway - authenticating HTTP entry point
//!
//! This is the main entry point for the gateway service.
//!
//! # Configuration
//!
//! Settings come from the environment; a `.env` file in the working
//! directory is loaded first when present. `SECRET` and the three backend
//! URLs (`USER_SERVICE_URL`, `INDICADORES_SERVICE_URL`, `MOCK_SERVICE_URL`)
//! are required.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oee_edge_gateway::{create_router, GatewayState, HttpUpstream, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,oee_edge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OEE Edge Gateway");
    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    let settings = Settings::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid gateway configuration");
    })?;
    let config = settings.gateway;

    tracing::info!(
        listen_addr = %config.listen_addr,
        cors_origins = ?config.cors_origins,
        max_body_bytes = config.max_body_bytes,
        upstream_timeout_seconds = config.upstream_timeout_seconds,
        routes_file = ?config.routes_file,
        backends = ?config.backends,
        "Gateway configuration loaded"
    );

    let routes = config.route_table().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid route table");
    })?;
    for route in routes.iter() {
        tracing::debug!(route = %route, requires_auth = route.requires_auth, "Route registered");
    }
    tracing::info!(routes = routes.len(), "Route table loaded");

    let upstream = Arc::new(HttpUpstream::new(config.upstream_timeout())?);

    let listen_addr = config.listen_addr.clone();
    let state = GatewayState::new(config, &settings.auth, routes, upstream);
    let app = create_router(state);

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
