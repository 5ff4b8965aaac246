//! Signal generator
//!
//! Fabricates plausible-looking signals on demand. Levels are fixed
//! multiples of the asset's current quote; everything else is drawn
//! uniformly from fixed sets. There is no detection logic behind it.

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use crate::store::TradingStore;
use crate::types::{Direction, Pattern, RiskLevel, Signal, Timeframe};

/// Patterns offered by the signal panel
pub const SIGNAL_PATTERNS: [Pattern; 4] = [
    Pattern::BullishEngulfing,
    Pattern::HeadAndShoulders,
    Pattern::DoubleBottom,
    Pattern::TriangleBreakout,
];

pub const MIN_CONFIDENCE: u8 = 70;
pub const MAX_CONFIDENCE: u8 = 99;

/// Entry/target/stop for `direction` around `entry`
pub fn price_levels(entry: f64, direction: Direction) -> (f64, f64) {
    match direction {
        Direction::Buy => (entry * 1.05, entry * 0.98),
        Direction::Sell => (entry * 0.95, entry * 1.02),
    }
}

pub struct SignalGenerator<R> {
    rng: R,
    last_id: u64,
}

impl<R: Rng> SignalGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, last_id: 0 }
    }

    /// Coin flip, as the "Generate Signal" button does
    pub fn random_direction(&mut self) -> Direction {
        if self.rng.gen_bool(0.5) {
            Direction::Buy
        } else {
            Direction::Sell
        }
    }

    pub fn generate(&mut self, store: &mut TradingStore, asset: &str, direction: Direction) -> Signal {
        self.generate_with_patterns(store, asset, direction, &SIGNAL_PATTERNS)
    }

    /// Build a signal for `asset`, push it into the store and return it.
    /// Unknown assets get zeroed price levels.
    pub fn generate_with_patterns(
        &mut self,
        store: &mut TradingStore,
        asset: &str,
        direction: Direction,
        patterns: &[Pattern],
    ) -> Signal {
        let entry_price = store.quote_price(asset).unwrap_or(0.0);
        let (target_price, stop_loss_price) = price_levels(entry_price, direction);

        let signal = Signal {
            id: self.next_id(),
            asset: asset.to_string(),
            direction,
            confidence: self.rng.gen_range(MIN_CONFIDENCE..=MAX_CONFIDENCE),
            entry_price,
            target_price,
            stop_loss_price,
            pattern: *patterns.choose(&mut self.rng).unwrap_or(&SIGNAL_PATTERNS[0]),
            timeframe: *Timeframe::ALL.choose(&mut self.rng).unwrap_or(&Timeframe::OneHour),
            risk_level: *RiskLevel::ALL.choose(&mut self.rng).unwrap_or(&RiskLevel::Medium),
            created_at: Utc::now(),
        };

        info!(
            "Generated {} signal #{} for {} @ {:.2} ({}, {}% conf)",
            signal.direction, signal.id, signal.asset, signal.entry_price, signal.pattern, signal.confidence
        );

        store.push_signal(signal.clone());
        signal
    }

    // Millisecond clock, bumped when two signals land in the same millisecond
    fn next_id(&mut self) -> u64 {
        let now_ms = Utc::now().timestamp_millis().max(0) as u64;
        self.last_id = now_ms.max(self.last_id + 1);
        self.last_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> SignalGenerator<StdRng> {
        SignalGenerator::new(StdRng::seed_from_u64(7))
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_buy_levels_from_quote() {
        let mut store = TradingStore::initialized();
        let signal = generator().generate(&mut store, "BTC/USDT", Direction::Buy);

        assert_eq!(signal.entry_price, 43250.50);
        assert!(approx(signal.target_price, 45413.03), "target {}", signal.target_price);
        assert!(approx(signal.stop_loss_price, 42385.49), "stop {}", signal.stop_loss_price);
        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&signal.confidence));
        assert!(SIGNAL_PATTERNS.contains(&signal.pattern));
        assert!(Timeframe::ALL.contains(&signal.timeframe));
    }

    #[test]
    fn test_sell_levels_from_quote() {
        let mut store = TradingStore::initialized();
        let signal = generator().generate(&mut store, "AAPL", Direction::Sell);

        assert_eq!(signal.entry_price, 185.25);
        assert!(approx(signal.target_price, 185.25 * 0.95));
        assert!(approx(signal.stop_loss_price, 185.25 * 1.02));
    }

    #[test]
    fn test_unknown_asset_zero_levels() {
        let mut store = TradingStore::initialized();
        let signal = generator().generate(&mut store, "UNKNOWN/SYM", Direction::Sell);

        assert_eq!(signal.entry_price, 0.0);
        assert_eq!(signal.target_price, 0.0);
        assert_eq!(signal.stop_loss_price, 0.0);
        assert_eq!(signal.asset, "UNKNOWN/SYM");
    }

    #[test]
    fn test_generated_signal_is_pushed_newest_first() {
        let mut store = TradingStore::initialized();
        let signal = generator().generate(&mut store, "ETH/USDT", Direction::Buy);

        assert_eq!(store.signals().len(), 4);
        assert_eq!(store.signals().first(), Some(&signal));
    }

    #[test]
    fn test_ids_unique_and_increasing() {
        let mut store = TradingStore::new();
        let mut gen = generator();

        let ids: Vec<u64> = (0..50)
            .map(|_| gen.generate(&mut store, "BTC/USDT", Direction::Buy).id)
            .collect();

        assert!(ids.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_random_fields_stay_in_range() {
        let mut store = TradingStore::initialized();
        let mut gen = generator();
        let mut confidences = Vec::new();

        for _ in 0..500 {
            let direction = gen.random_direction();
            let signal = gen.generate(&mut store, "EUR/USD", direction);
            assert!(SIGNAL_PATTERNS.contains(&signal.pattern));
            confidences.push(signal.confidence);
        }

        assert!(confidences.iter().all(|c| (70..=99).contains(c)));
        // 500 uniform draws over 30 values hit both ends
        assert!(confidences.contains(&70));
        assert!(confidences.contains(&99));
    }

    #[test]
    fn test_custom_pattern_set() {
        let mut store = TradingStore::initialized();
        let only = [Pattern::CupAndHandle];
        let signal = generator().generate_with_patterns(&mut store, "TSLA", Direction::Buy, &only);
        assert_eq!(signal.pattern, Pattern::CupAndHandle);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = TradingStore::initialized();
        let mut b = TradingStore::initialized();

        let x = generator().generate(&mut a, "BTC/USDT", Direction::Buy);
        let y = generator().generate(&mut b, "BTC/USDT", Direction::Buy);

        assert_eq!(
            (x.confidence, x.pattern, x.timeframe, x.risk_level),
            (y.confidence, y.pattern, y.timeframe, y.risk_level)
        );
    }
}
