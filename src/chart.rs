//! Mock candle series and pattern detection for the chart view

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::Pattern;

pub const CANDLE_COUNT: usize = 20;

/// Starting price when the symbol has no quote
pub const FALLBACK_PRICE: f64 = 43000.0;

const HOUR_MS: i64 = 3_600_000;

/// Patterns the chart's detect button can report. The detected pattern is
/// carried on the signal the button generates.
pub const CHART_PATTERNS: [Pattern; 4] = [
    Pattern::HeadAndShoulders,
    Pattern::DoubleTop,
    Pattern::BullishFlag,
    Pattern::TriangleBreakout,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64, // unix ms
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Hourly candles ending at `now_ms`, random-walking from `start_price`.
/// Each close moves at most 0.5% of price.
pub fn mock_candles<R: Rng>(rng: &mut R, start_price: f64, now_ms: i64) -> Vec<Candle> {
    let mut price = start_price;
    let mut candles = Vec::with_capacity(CANDLE_COUNT);

    for i in 0..CANDLE_COUNT {
        price += (rng.gen::<f64>() - 0.5) * (price * 0.01);
        candles.push(Candle {
            time: now_ms - (CANDLE_COUNT - i) as i64 * HOUR_MS,
            open: price - rng.gen::<f64>() * (price * 0.005),
            high: price + rng.gen::<f64>() * (price * 0.005),
            low: price - rng.gen::<f64>() * (price * 0.005),
            close: price,
            volume: rng.gen::<f64>() * 1_000_000.0,
        });
    }

    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_series_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        let now = 1_700_000_000_000;
        let candles = mock_candles(&mut rng, 185.25, now);

        assert_eq!(candles.len(), CANDLE_COUNT);
        assert_eq!(candles[0].time, now - 20 * HOUR_MS);
        assert_eq!(candles[CANDLE_COUNT - 1].time, now - HOUR_MS);
        assert!(candles.windows(2).all(|w| w[1].time - w[0].time == HOUR_MS));
    }

    #[test]
    fn test_candles_positive_and_bounded() {
        let mut rng = StdRng::seed_from_u64(12);
        let candles = mock_candles(&mut rng, FALLBACK_PRICE, 0);

        let mut prev = FALLBACK_PRICE;
        for c in &candles {
            assert!(c.close > 0.0 && c.low > 0.0);
            assert!(c.high >= c.close && c.open <= c.close && c.low <= c.close);
            assert!((c.close - prev).abs() <= prev * 0.005 + 1e-9);
            assert!((0.0..1_000_000.0).contains(&c.volume));
            prev = c.close;
        }
    }

    #[test]
    fn test_chart_pattern_labels() {
        let labels: Vec<&str> = CHART_PATTERNS.iter().map(|p| p.label()).collect();
        assert_eq!(
            labels,
            ["Head & Shoulders", "Double Top", "Bullish Flag", "Triangle Breakout"]
        );
        assert_eq!(
            serde_json::to_value(Pattern::BullishFlag).unwrap(),
            serde_json::json!("Bullish Flag")
        );
    }
}
