//! Trading desk state store
//!
//! Single owner of quotes, signals, watchlist, selected asset and UI
//! preferences. Everything else reads snapshots and goes through the
//! mutation methods here; nothing touches the fields directly.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{
    DeskSnapshot, Direction, MarketKind, Pattern, Preferences, Quote, QuoteBook, RiskLevel,
    Signal, Timeframe,
};
use crate::watchlist::Watchlist;

/// Maximum number of signals kept, newest first
pub const MAX_SIGNALS: usize = 10;

pub const DEFAULT_ASSET: &str = "BTC/USDT";

const SEED_QUOTES: [(&str, f64, f64, &str); 6] = [
    ("BTC/USDT", 43250.50, 2.45, "1.2B"),
    ("ETH/USDT", 2650.75, -1.23, "850M"),
    ("EUR/USD", 1.0875, 0.15, "2.1B"),
    ("GBP/USD", 1.2650, -0.08, "1.8B"),
    ("AAPL", 185.25, 1.85, "45M"),
    ("TSLA", 248.50, -2.15, "38M"),
];

const SEED_WATCHLIST: [&str; 4] = ["BTC/USDT", "ETH/USDT", "EUR/USD", "AAPL"];

fn seed_signals(now: DateTime<Utc>) -> Vec<Signal> {
    vec![
        Signal {
            id: 1,
            asset: "BTC/USDT".to_string(),
            direction: Direction::Buy,
            confidence: 85,
            entry_price: 43200.0,
            target_price: 45000.0,
            stop_loss_price: 42000.0,
            pattern: Pattern::BullishEngulfing,
            timeframe: Timeframe::FourHours,
            risk_level: RiskLevel::Medium,
            created_at: now,
        },
        Signal {
            id: 2,
            asset: "EUR/USD".to_string(),
            direction: Direction::Sell,
            confidence: 78,
            entry_price: 1.0880,
            target_price: 1.0820,
            stop_loss_price: 1.0920,
            pattern: Pattern::HeadAndShoulders,
            timeframe: Timeframe::OneHour,
            risk_level: RiskLevel::Low,
            created_at: now,
        },
        Signal {
            id: 3,
            asset: "AAPL".to_string(),
            direction: Direction::Buy,
            confidence: 92,
            entry_price: 185.00,
            target_price: 195.00,
            stop_loss_price: 180.00,
            pattern: Pattern::DoubleBottom,
            timeframe: Timeframe::OneDay,
            risk_level: RiskLevel::High,
            created_at: now,
        },
    ]
}

#[derive(Debug, Clone, Default)]
pub struct TradingStore {
    quotes: QuoteBook,
    signals: Vec<Signal>,
    watchlist: Watchlist,
    selected_asset: String,
    preferences: Preferences,
}

impl TradingStore {
    /// Empty store. Call `initialize` to load seed data.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialized() -> Self {
        let mut store = Self::new();
        store.initialize();
        store
    }

    /// Load the fixed seed set. Resets everything, including state that
    /// dependents may have derived from the previous contents.
    pub fn initialize(&mut self) {
        self.initialize_at(Utc::now());
    }

    /// Same as `initialize` with an explicit timestamp for the seed signals
    pub fn initialize_at(&mut self, now: DateTime<Utc>) {
        self.quotes = SEED_QUOTES
            .iter()
            .map(|&(symbol, price, change, volume)| {
                (symbol.to_string(), Quote::new(price, change, volume))
            })
            .collect();
        self.signals = seed_signals(now);
        self.watchlist = SEED_WATCHLIST.into_iter().collect();
        self.selected_asset = DEFAULT_ASSET.to_string();
        self.preferences = Preferences::default();
        debug!(
            "Store initialized: {} quotes, {} signals, {} watched",
            self.quotes.len(),
            self.signals.len(),
            self.watchlist.len()
        );
    }

    pub fn quotes(&self) -> &QuoteBook {
        &self.quotes
    }

    pub fn quote(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    pub fn quote_price(&self, symbol: &str) -> Option<f64> {
        self.quotes.get(symbol).map(|q| q.price)
    }

    /// Newest first
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn signal(&self, id: u64) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == id)
    }

    pub fn watchlist(&self) -> &[String] {
        self.watchlist.symbols()
    }

    pub fn selected_asset(&self) -> &str {
        &self.selected_asset
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
    }

    pub fn snapshot(&self) -> DeskSnapshot {
        DeskSnapshot {
            quotes: self.quotes.clone(),
            signals: self.signals.clone(),
            watchlist: self.watchlist.symbols().to_vec(),
            selected_asset: self.selected_asset.clone(),
            preferences: self.preferences,
        }
    }

    /// Replace a quote's price and change. Unknown symbols and prices that
    /// are not finite and positive are ignored.
    pub fn apply_quote_update(&mut self, symbol: &str, new_price: f64, percent_change: f64) {
        if !(new_price.is_finite() && new_price > 0.0) {
            return;
        }
        if let Some(quote) = self.quotes.get_mut(symbol) {
            quote.price = new_price;
            quote.percent_change = percent_change;
        }
    }

    /// Prepend `signal`, evicting the oldest past `MAX_SIGNALS`
    pub fn push_signal(&mut self, signal: Signal) {
        self.signals.insert(0, signal);
        self.signals.truncate(MAX_SIGNALS);
    }

    pub fn add_watchlist_symbol(&mut self, symbol: &str) -> bool {
        self.watchlist.add(symbol)
    }

    pub fn remove_watchlist_symbol(&mut self, symbol: &str) -> bool {
        self.watchlist.remove(symbol)
    }

    pub fn set_selected_asset(&mut self, symbol: &str) {
        self.selected_asset = symbol.to_string();
    }

    pub fn set_market(&mut self, market: MarketKind) {
        self.preferences.market = market;
    }

    pub fn set_risk_tolerance(&mut self, level: RiskLevel) {
        self.preferences.risk_tolerance = level;
    }
}
