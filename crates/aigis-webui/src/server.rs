use std::sync::Arc;

use aigis_hal::{ConnectionRegistry, HalHandle, TelemetryFrame};
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::{routes, UiConfig};

pub struct ServerState {
    pub hal: HalHandle,
    pub registry: Arc<ConnectionRegistry<TelemetryFrame>>,
}

/// Builds the HTTP + WebSocket application.
pub fn router(config: &UiConfig, state: Arc<ServerState>) -> Router {
    let app = Router::new()
        .route("/status", get(routes::get_status))
        .route("/scenarios", get(routes::get_scenarios))
        .route("/command/:cmd", post(routes::post_command))
        .route("/scenario/:name", post(routes::post_scenario))
        .route("/control/manual", post(routes::post_manual_control))
        .route("/ws/telemetry", get(routes::websocket));

    let app = match &config.static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.route("/", get(routes::root)),
    };

    app.with_state(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

/// Serves the UI until a shutdown signal is received.
pub async fn start(
    config: UiConfig,
    hal: HalHandle,
    registry: Arc<ConnectionRegistry<TelemetryFrame>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let state = Arc::new(ServerState { hal, registry });
    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .context(format!("Failed to bind web server to port {}", config.port))?;
    log::info!("Webui running at http://localhost:{}", config.port);
    if let Some(dir) = &config.static_dir {
        log::info!("Serving UI assets from {}", dir.display());
    }

    let shutdown_fut = async move {
        let _ = shutdown_rx.recv().await;
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_fut)
        .await
        .context("Web server failed")?;
    log::info!("Webui stopped");
    Ok(())
}
