//! WebSocket server bridging browser terminals to device shells.

pub mod buffer;
pub mod controller;
pub mod routes;
pub mod state;
pub mod tunnel;

use axum::Router;
use shell_core::config::AppConfig;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use controller::{Inbound, Outbound, RemoteShell, SessionState, ShellContext, ShellSettings};
pub use state::AppState;
pub use tunnel::{AdbTunnel, DeviceTunnel};

/// Build the axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = state.config.server.cors;

    let mut app = Router::new()
        .merge(routes::health_routes())
        .merge(routes::shell_routes())
        .with_state(state);

    app = app.layer(TraceLayer::new_for_http());

    if cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

/// Start the HTTP server.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let state = AppState::new(config.clone());
    tracing::info!(
        framing = ?state.shell.settings.framing,
        adb = %state.shell.settings.adb.display(),
        remote = %state.shell.settings.remote_port,
        "Shell sessions configured"
    );
    let router = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
