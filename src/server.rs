//! HTTP + WebSocket surface over the desk state

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{debug, info};

use crate::api;
use crate::types::{AppState, ClientMessage, WsMessage};

pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/desk", get(api::get_desk))
        .route("/api/desk/quotes", get(api::get_quotes))
        .route(
            "/api/desk/signals",
            get(api::get_signals).post(api::generate_signal),
        )
        .route("/api/desk/signals/{id}/execute", post(api::execute_signal))
        .route(
            "/api/desk/watchlist",
            get(api::get_watchlist)
                .post(api::add_to_watchlist)
                .delete(api::remove_from_watchlist),
        )
        .route("/api/desk/selected", put(api::select_asset))
        .route("/api/desk/preferences", put(api::update_preferences))
        .route("/api/desk/risk", get(api::get_risk))
        .route("/api/desk/chart", get(api::get_chart))
        .route("/api/desk/chart/detect", post(api::detect_pattern))
        .route(
            "/api/desk/assistant",
            get(api::get_chat).post(api::ask_assistant),
        )
        .route("/api/login", post(api::route_stub))
        .route("/api/register", post(api::route_stub))
        .route("/api/signals", get(api::route_stub).post(api::route_stub))
        .route("/api/strategies", get(api::route_stub).post(api::route_stub));

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.tx.subscribe();

    // Send current state to new client
    let snapshot = state.store.read().await.snapshot();
    if let Ok(json) = serde_json::to_string(&WsMessage::Snapshot(snapshot)) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    // Replies meant only for this client
    let (reply_tx, mut reply_rx) = mpsc::channel::<WsMessage>(32);

    // Forward broadcasts and direct replies to this client
    let send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                msg = rx.recv() => match msg {
                    Ok(msg) => msg,
                    Err(_) => break,
                },
                Some(msg) = reply_rx.recv() => msg,
            };
            if let Ok(json) = serde_json::to_string(&msg) {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Client actions
    let state_clone = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => handle_client_message(&state_clone, client_msg).await,
                    Err(e) => {
                        debug!("Malformed client message: {}", e);
                        Some(WsMessage::Error {
                            message: format!("Malformed message: {}", e),
                        })
                    }
                };
                if let Some(reply) = reply {
                    if reply_tx.send(reply).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("WebSocket client disconnected");
}

/// Apply one client action. State changes are broadcast; the returned
/// message, if any, goes back to the sender only.
async fn handle_client_message(state: &AppState, msg: ClientMessage) -> Option<WsMessage> {
    match (msg.action.as_str(), msg.symbol) {
        ("generate_signal", symbol) => {
            let asset = match symbol {
                Some(s) => s,
                None => state.store.read().await.selected_asset().to_string(),
            };
            state.generate_signal(&asset, msg.direction).await;
            None
        }
        ("add_watchlist", Some(symbol)) => {
            let symbols = {
                let mut store = state.store.write().await;
                store.add_watchlist_symbol(&symbol).then(|| store.watchlist().to_vec())
            };
            if let Some(symbols) = symbols {
                state.publish(WsMessage::Watchlist { symbols });
            }
            None
        }
        ("remove_watchlist", Some(symbol)) => {
            let symbols = {
                let mut store = state.store.write().await;
                store.remove_watchlist_symbol(&symbol).then(|| store.watchlist().to_vec())
            };
            if let Some(symbols) = symbols {
                state.publish(WsMessage::Watchlist { symbols });
            }
            None
        }
        ("select_asset", Some(symbol)) => {
            state.select_asset(&symbol).await;
            None
        }
        (action @ ("add_watchlist" | "remove_watchlist" | "select_asset"), None) => {
            Some(WsMessage::Error {
                message: format!("Missing symbol for {}", action),
            })
        }
        (action, _) => Some(WsMessage::Error {
            message: format!("Unsupported action: {}", action),
        }),
    }
}
