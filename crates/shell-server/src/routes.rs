use crate::controller::{Inbound, Outbound, RemoteShell};
use crate::state::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use shell_core::{ConnectionQuery, OutputFrame};
use tokio::sync::mpsc;

// ── Health ──────────────────────────────────────────────────────────────

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ── Shell ───────────────────────────────────────────────────────────────

pub fn shell_routes() -> Router<AppState> {
    Router::new().route("/", get(shell_upgrade))
}

async fn shell_upgrade(
    State(state): State<AppState>,
    query: Result<Query<ConnectionQuery>, QueryRejection>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let Some(shell) = RemoteShell::process_request(&query, state.shell.clone(), out_tx) else {
        return (StatusCode::BAD_REQUEST, "Unsupported action").into_response();
    };

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| bridge(socket, shell, out_rx)),
        Err(rejection) => rejection.into_response(),
    }
}

/// Pump frames between the socket and the session until the session ends.
async fn bridge(
    socket: WebSocket,
    shell: RemoteShell,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let session = shell.id();
    let (mut sink, mut stream) = socket.split();
    let (in_tx, in_rx) = mpsc::unbounded_channel();

    let send_task = tokio::spawn(async move {
        while let Some(out) = outbound.recv().await {
            let msg = match out {
                Outbound::Frame(OutputFrame::Binary(bytes)) => Message::Binary(bytes.into()),
                Outbound::Frame(OutputFrame::Text(text)) => Message::Text(text.into()),
                Outbound::Close { code, reason } => {
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    return;
                }
            };
            if sink.send(msg).await.is_err() {
                return;
            }
        }
        // Session released without an explicit close.
        let _ = sink.send(Message::Close(None)).await;
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            let inbound = match msg {
                Message::Text(text) => Inbound::Text(text.as_str().to_owned()),
                Message::Binary(bytes) => Inbound::Binary(bytes.to_vec()),
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => continue,
            };
            if in_tx.send(inbound).is_err() {
                break;
            }
        }
    });

    tracing::debug!(%session, "Shell connection upgraded");
    shell.run(in_rx).await;
    recv_task.abort();
    let _ = send_task.await;
    tracing::debug!(%session, "Shell connection closed");
}
