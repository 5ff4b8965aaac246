use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::assistant::{Assistant, ChatMessage};
use crate::chart::CHART_PATTERNS;
use crate::config::DeskConfig;
use crate::generator::SignalGenerator;
use crate::store::TradingStore;

/// Current price record for one tradable symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub price: f64,
    pub percent_change: f64,
    pub volume: String, // display string, e.g. "1.2B"
}

impl Quote {
    pub fn new(price: f64, percent_change: f64, volume: &str) -> Self {
        Self {
            price,
            percent_change,
            volume: volume.to_string(),
        }
    }
}

/// Quotes keyed by symbol. Ordered so ticks walk symbols deterministically.
pub type QuoteBook = BTreeMap<String, Quote>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Chart pattern labels attached to fabricated signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    #[serde(rename = "Bullish Engulfing")]
    BullishEngulfing,
    #[serde(rename = "Head & Shoulders")]
    HeadAndShoulders,
    #[serde(rename = "Double Bottom")]
    DoubleBottom,
    #[serde(rename = "Double Top")]
    DoubleTop,
    #[serde(rename = "Triangle Breakout")]
    TriangleBreakout,
    #[serde(rename = "Ascending Triangle")]
    AscendingTriangle,
    #[serde(rename = "Bull Flag")]
    BullFlag,
    #[serde(rename = "Bullish Flag")]
    BullishFlag,
    #[serde(rename = "Cup & Handle")]
    CupAndHandle,
}

impl Pattern {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BullishEngulfing => "Bullish Engulfing",
            Self::HeadAndShoulders => "Head & Shoulders",
            Self::DoubleBottom => "Double Bottom",
            Self::DoubleTop => "Double Top",
            Self::TriangleBreakout => "Triangle Breakout",
            Self::AscendingTriangle => "Ascending Triangle",
            Self::BullFlag => "Bull Flag",
            Self::BullishFlag => "Bullish Flag",
            Self::CupAndHandle => "Cup & Handle",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1H")]
    OneHour,
    #[serde(rename = "4H")]
    FourHours,
    #[serde(rename = "1D")]
    OneDay,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::OneHour, Timeframe::FourHours, Timeframe::OneDay];
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneHour => write!(f, "1H"),
            Self::FourHours => write!(f, "4H"),
            Self::OneDay => write!(f, "1D"),
        }
    }
}

/// Market class the user is browsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    #[default]
    Crypto,
    Forex,
    Stocks,
}

/// Fabricated buy/sell recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: u64,
    pub asset: String,
    pub direction: Direction,
    pub confidence: u8, // 70..=99
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss_price: f64,
    pub pattern: Pattern,
    pub timeframe: Timeframe,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
}

/// UI preference flags kept alongside market state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub market: MarketKind,
    pub risk_tolerance: RiskLevel,
}

/// Owned copy of the whole desk, safe to hand out after the lock is released
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeskSnapshot {
    pub quotes: QuoteBook,
    pub signals: Vec<Signal>,
    pub watchlist: Vec<String>,
    pub selected_asset: String,
    pub preferences: Preferences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsMessage {
    Snapshot(DeskSnapshot),
    Quotes { quotes: QuoteBook },
    Signal(Signal),
    Watchlist { symbols: Vec<String> },
    SelectedAsset { symbol: String },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    pub action: String,
    pub symbol: Option<String>,
    pub direction: Option<Direction>,
}

/// Shared application state
pub struct AppState {
    pub tx: broadcast::Sender<WsMessage>,
    pub store: RwLock<TradingStore>,
    pub generator: Mutex<SignalGenerator<StdRng>>,
    pub assistant: Mutex<Assistant>,
    pub chart_rng: Mutex<StdRng>,
    pub config: DeskConfig,
}

impl AppState {
    pub fn new(config: DeskConfig) -> Self {
        let (tx, _rx) = broadcast::channel::<WsMessage>(1000);
        let store = TradingStore::initialized();
        let assistant = Assistant::new(config.rng("assistant"), store.selected_asset());

        Self {
            tx,
            store: RwLock::new(store),
            generator: Mutex::new(SignalGenerator::new(config.rng("generator"))),
            assistant: Mutex::new(assistant),
            chart_rng: Mutex::new(config.rng("chart")),
            config,
        }
    }

    /// Broadcast to WebSocket clients. No receivers is fine.
    pub fn publish(&self, msg: WsMessage) {
        let _ = self.tx.send(msg);
    }

    /// Generate a signal under the generator-then-store lock order and broadcast it
    pub async fn generate_signal(&self, asset: &str, direction: Option<Direction>) -> Signal {
        let mut generator = self.generator.lock().await;
        let direction = direction.unwrap_or_else(|| generator.random_direction());
        let signal = {
            let mut store = self.store.write().await;
            generator.generate(&mut *store, asset, direction)
        };
        self.publish(WsMessage::Signal(signal.clone()));
        signal
    }

    /// Chart "detect pattern": a signal on the selected asset drawn from the chart's pattern set
    pub async fn detect_pattern(&self) -> Signal {
        let mut generator = self.generator.lock().await;
        let direction = generator.random_direction();
        let signal = {
            let mut store = self.store.write().await;
            let asset = store.selected_asset().to_string();
            generator.generate_with_patterns(&mut *store, &asset, direction, &CHART_PATTERNS)
        };
        self.publish(WsMessage::Signal(signal.clone()));
        signal
    }

    /// Answer a chat message. Lock order: assistant, generator, store.
    pub async fn ask(&self, message: &str) -> ChatMessage {
        let mut assistant = self.assistant.lock().await;
        let mut generator = self.generator.lock().await;
        let reply = {
            let mut store = self.store.write().await;
            assistant.reply(message, &mut *store, &mut *generator)
        };
        if let Some(signal) = &reply.signal {
            self.publish(WsMessage::Signal(signal.clone()));
        }
        reply
    }

    /// Switch the selected asset and restart the chat about it
    pub async fn select_asset(&self, symbol: &str) {
        let mut assistant = self.assistant.lock().await;
        self.store.write().await.set_selected_asset(symbol);
        assistant.reset(symbol);
        drop(assistant);

        self.publish(WsMessage::SelectedAsset {
            symbol: symbol.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(DeskConfig {
            seed: Some(5),
            ..Default::default()
        })
    }

    #[test]
    fn test_defaults() {
        assert_eq!(RiskLevel::default(), RiskLevel::Medium);
        assert_eq!(
            Preferences::default(),
            Preferences {
                market: MarketKind::Crypto,
                risk_tolerance: RiskLevel::Medium,
            }
        );
    }

    #[tokio::test]
    async fn test_select_asset_resets_chat() {
        let state = state();
        let mut rx = state.tx.subscribe();
        state.ask("hello").await;
        assert_eq!(state.assistant.lock().await.history().len(), 3);

        state.select_asset("TSLA").await;

        assert_eq!(state.store.read().await.selected_asset(), "TSLA");
        let history = state.assistant.lock().await.history().to_vec();
        assert_eq!(history.len(), 1);
        assert!(history[0].message.contains("TSLA"));
        assert!(matches!(
            rx.try_recv(),
            Ok(WsMessage::SelectedAsset { symbol }) if symbol == "TSLA"
        ));
    }
}
