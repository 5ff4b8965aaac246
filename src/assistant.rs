//! Scripted chat assistant
//!
//! Keyword-routed canned replies about the selected asset. The only
//! reply with a side effect is a signal request, which goes through the
//! regular generator and lands in the store like any other signal.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::generator::SignalGenerator;
use crate::store::TradingStore;
use crate::types::{Pattern, Signal};

/// Patterns the assistant may say it sees forming
pub const ASSISTANT_PATTERNS: [Pattern; 5] = [
    Pattern::HeadAndShoulders,
    Pattern::DoubleBottom,
    Pattern::AscendingTriangle,
    Pattern::BullFlag,
    Pattern::CupAndHandle,
];

/// Oldest messages are dropped past this many
pub const MAX_CHAT_HISTORY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Set when the reply generated a signal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
}

impl ChatMessage {
    fn new(role: Role, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            message,
            timestamp: Utc::now(),
            signal: None,
        }
    }
}

/// What a user message is asking for. First matching keyword wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Signal,
    Analysis,
    Risk,
    Pattern,
    General,
}

impl Intent {
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();
        if msg.contains("signal") || msg.contains("trade") {
            Self::Signal
        } else if msg.contains("analysis") || msg.contains("analyze") {
            Self::Analysis
        } else if msg.contains("risk") {
            Self::Risk
        } else if msg.contains("pattern") {
            Self::Pattern
        } else {
            Self::General
        }
    }
}

pub struct Assistant {
    history: Vec<ChatMessage>,
    rng: StdRng,
}

impl Assistant {
    pub fn new(rng: StdRng, selected_asset: &str) -> Self {
        Self {
            history: vec![greeting(selected_asset)],
            rng,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Start a fresh conversation about `selected_asset`
    pub fn reset(&mut self, selected_asset: &str) {
        self.history.clear();
        self.history.push(greeting(selected_asset));
    }

    fn push(&mut self, message: ChatMessage) {
        self.history.push(message);
        if self.history.len() > MAX_CHAT_HISTORY {
            let excess = self.history.len() - MAX_CHAT_HISTORY;
            self.history.drain(..excess);
        }
    }

    /// Record `message`, answer it against the current store and return the reply
    pub fn reply<R: Rng>(
        &mut self,
        message: &str,
        store: &mut TradingStore,
        generator: &mut SignalGenerator<R>,
    ) -> ChatMessage {
        self.push(ChatMessage::new(Role::User, message.to_string()));

        let asset = store.selected_asset().to_string();
        let mut signal = None;

        let text = match Intent::classify(message) {
            Intent::Signal => {
                let direction = generator.random_direction();
                let s = generator.generate(store, &asset, direction);
                let text = format!(
                    "I've generated a new {} signal for {}! Based on the {} pattern, I recommend a {} position with {}% confidence. Entry at {:.2}, target {:.2}.",
                    s.direction, asset, s.pattern, s.direction, s.confidence, s.entry_price, s.target_price
                );
                signal = Some(s);
                text
            }
            Intent::Analysis => match store.quote(&asset) {
                Some(quote) => format!(
                    "Analyzing {}... Current price is {:.2}. The market is showing {} momentum with {:.2}% movement. I detect potential support at {:.2} and resistance at {:.2}.",
                    asset,
                    quote.price,
                    if quote.percent_change >= 0.0 { "bullish" } else { "bearish" },
                    quote.percent_change.abs(),
                    quote.price * 0.98,
                    quote.price * 1.02
                ),
                None => format!(
                    "Analyzing {}... I don't have a live quote for it yet, so there are no levels to report.",
                    asset
                ),
            },
            Intent::Risk => format!(
                "Risk assessment for {}: Current volatility is moderate. I recommend position sizing at 2-3% of portfolio for this trade. Consider setting stop-loss at 2% below entry for optimal risk management.",
                asset
            ),
            Intent::Pattern => {
                let pattern = *ASSISTANT_PATTERNS
                    .choose(&mut self.rng)
                    .unwrap_or(&ASSISTANT_PATTERNS[0]);
                let bias = if self.rng.gen_bool(0.5) { "bullish" } else { "bearish" };
                format!(
                    "I'm detecting a potential {} pattern forming on {}. This typically indicates {} momentum. Watch for confirmation with volume increase.",
                    pattern, asset, bias
                )
            }
            Intent::General => format!(
                "I understand you're asking about {}. Based on current market conditions, I recommend monitoring the key levels and waiting for clear signals. Would you like me to generate a specific trading signal or analyze a particular pattern?",
                asset
            ),
        };

        let mut reply = ChatMessage::new(Role::Assistant, text);
        reply.signal = signal;
        self.push(reply.clone());
        reply
    }
}

fn greeting(selected_asset: &str) -> ChatMessage {
    ChatMessage::new(
        Role::Assistant,
        format!(
            "Hello! I'm your trading assistant. I can help you analyze {} and generate trading signals. What would you like to know?",
            selected_asset
        ),
    )
}
