// Library crate - desk state, simulators and the HTTP surface

pub mod types;
pub mod config;
pub mod watchlist;
pub mod store;
pub mod updater;
pub mod generator;
pub mod risk;
pub mod chart;
pub mod assistant;
pub mod api;
pub mod server;

// Re-export commonly used types
pub use types::*;
pub use config::DeskConfig;
pub use store::TradingStore;
pub use generator::SignalGenerator;
pub use updater::{spawn_price_updater, UpdaterHandle};
