use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::assistant::ChatMessage;
use crate::chart::{self, Candle, FALLBACK_PRICE};
use crate::risk::{self, RiskGauge};
use crate::types::{AppState, Direction, MarketKind, Preferences, RiskLevel, WsMessage};

/// Body for generating a signal. Missing fields fall back to the
/// selected asset and a coin-flip direction.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    pub asset: Option<String>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolRequest {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesRequest {
    pub market: Option<MarketKind>,
    pub risk_tolerance: Option<RiskLevel>,
}

#[derive(Debug, Deserialize)]
pub struct ChartQueryParams {
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

/// Response for the chart endpoint
#[derive(Serialize)]
pub struct ChartResponse {
    pub symbol: String,
    pub candles: Vec<Candle>,
}

/// Response for watchlist mutations
#[derive(Serialize)]
pub struct WatchlistResponse {
    pub symbols: Vec<String>,
    pub changed: bool,
}

fn not_implemented(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(serde_json::json!({"error": message})),
    )
}

/// GET /api/desk - Full snapshot
pub async fn get_desk(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.store.read().await.snapshot();
    Json(snapshot)
}

/// GET /api/desk/quotes
pub async fn get_quotes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let quotes = state.store.read().await.quotes().clone();
    Json(quotes)
}

/// GET /api/desk/signals - Newest first
pub async fn get_signals(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let signals = state.store.read().await.signals().to_vec();
    Json(signals)
}

/// POST /api/desk/signals - Generate a signal
pub async fn generate_signal(
    State(state): State<Arc<AppState>>,
    body: Option<Json<GenerateRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let asset = match req.asset {
        Some(asset) => asset,
        None => state.store.read().await.selected_asset().to_string(),
    };

    let signal = state.generate_signal(&asset, req.direction).await;
    (StatusCode::CREATED, Json(signal))
}

/// POST /api/desk/signals/{id}/execute - Execution is not wired up
pub async fn execute_signal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    if state.store.read().await.signal(id).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": format!("Signal {} not found", id)})),
        );
    }
    info!("Execution requested for signal #{}", id);
    not_implemented("Trading execution coming soon")
}

/// GET /api/desk/watchlist
pub async fn get_watchlist(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let symbols = state.store.read().await.watchlist().to_vec();
    Json(symbols)
}

/// POST /api/desk/watchlist - Add a symbol
pub async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SymbolRequest>,
) -> impl IntoResponse {
    let (changed, symbols) = {
        let mut store = state.store.write().await;
        let changed = store.add_watchlist_symbol(&req.symbol);
        (changed, store.watchlist().to_vec())
    };
    if changed {
        info!("Added {} to watchlist", req.symbol);
        state.publish(WsMessage::Watchlist { symbols: symbols.clone() });
    }
    Json(WatchlistResponse { symbols, changed })
}

/// DELETE /api/desk/watchlist - Remove a symbol
pub async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SymbolRequest>,
) -> impl IntoResponse {
    let (changed, symbols) = {
        let mut store = state.store.write().await;
        let changed = store.remove_watchlist_symbol(&req.symbol);
        (changed, store.watchlist().to_vec())
    };
    if changed {
        info!("Removed {} from watchlist", req.symbol);
        state.publish(WsMessage::Watchlist { symbols: symbols.clone() });
    }
    Json(WatchlistResponse { symbols, changed })
}

/// PUT /api/desk/selected
pub async fn select_asset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SymbolRequest>,
) -> impl IntoResponse {
    state.select_asset(&req.symbol).await;
    Json(serde_json::json!({"selectedAsset": req.symbol}))
}

/// PUT /api/desk/preferences
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreferencesRequest>,
) -> impl IntoResponse {
    let mut store = state.store.write().await;
    if let Some(market) = req.market {
        store.set_market(market);
    }
    if let Some(level) = req.risk_tolerance {
        store.set_risk_tolerance(level);
    }
    let prefs: Preferences = store.preferences();
    drop(store);
    Json(prefs)
}

/// GET /api/desk/risk
pub async fn get_risk(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let gauge: RiskGauge = risk::assess(state.store.read().await.signals());
    Json(gauge)
}

/// GET /api/desk/chart?symbol= - Mock candles, defaults to the selected asset
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChartQueryParams>,
) -> impl IntoResponse {
    let (symbol, price) = {
        let store = state.store.read().await;
        let symbol = params
            .symbol
            .unwrap_or_else(|| store.selected_asset().to_string());
        let price = store.quote_price(&symbol).unwrap_or(FALLBACK_PRICE);
        (symbol, price)
    };

    let candles = {
        let mut rng = state.chart_rng.lock().await;
        chart::mock_candles(&mut *rng, price, Utc::now().timestamp_millis())
    };

    Json(ChartResponse { symbol, candles })
}

/// POST /api/desk/chart/detect
pub async fn detect_pattern(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let signal = state.detect_pattern().await;
    (StatusCode::CREATED, Json(signal))
}

/// GET /api/desk/assistant - Chat history
pub async fn get_chat(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let history: Vec<ChatMessage> = state.assistant.lock().await.history().to_vec();
    Json(history)
}

/// POST /api/desk/assistant
pub async fn ask_assistant(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    let reply = state.ask(&req.message).await;
    Json(reply)
}

/// Declared backend routes with no handler behind them
pub async fn route_stub() -> impl IntoResponse {
    not_implemented("Not implemented")
}
