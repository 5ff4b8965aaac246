//! Portfolio risk gauge over the active signals

use serde::{Deserialize, Serialize};

use crate::types::{RiskLevel, Signal};

/// Reading shown when there are no signals
pub const IDLE_SCORE: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskGauge {
    /// 10..=90
    pub score: f64,
    pub level: RiskLevel,
    pub signal_count: usize,
}

fn level_score(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::Low => 20.0,
        RiskLevel::Medium => 50.0,
        RiskLevel::High => 80.0,
    }
}

/// Bucket a score: <= 30 low, <= 60 medium, above that high
pub fn classify(score: f64) -> RiskLevel {
    if score <= 30.0 {
        RiskLevel::Low
    } else if score <= 60.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

pub fn assess(signals: &[Signal]) -> RiskGauge {
    let score = if signals.is_empty() {
        IDLE_SCORE
    } else {
        let total: f64 = signals.iter().map(|s| level_score(s.risk_level)).sum();
        (total / signals.len() as f64).clamp(10.0, 90.0)
    };

    RiskGauge {
        score,
        level: classify(score),
        signal_count: signals.len(),
    }
}
