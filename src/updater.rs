//! Periodic price updater
//!
//! Random-walks every quote by a uniform percentage in (-1%, +1%) on a
//! fixed interval. The task is owned through an `UpdaterHandle`: cancel it
//! explicitly, or drop the handle to abort it.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::store::TradingStore;
use crate::types::{AppState, WsMessage};

/// Largest absolute move per tick, in percent
pub const MAX_TICK_PERCENT: f64 = 1.0;

/// Uniform draw from the open interval (-MAX_TICK_PERCENT, MAX_TICK_PERCENT)
pub fn draw_percent<R: Rng>(rng: &mut R) -> f64 {
    loop {
        let pct = rng.gen_range(-MAX_TICK_PERCENT..MAX_TICK_PERCENT);
        if pct > -MAX_TICK_PERCENT {
            return pct;
        }
    }
}

/// Apply one tick to every quote in the store
pub fn tick<R: Rng>(store: &mut TradingStore, rng: &mut R) {
    let prices: Vec<(String, f64)> = store
        .quotes()
        .iter()
        .map(|(symbol, quote)| (symbol.clone(), quote.price))
        .collect();

    for (symbol, price) in prices {
        let pct = draw_percent(rng);
        store.apply_quote_update(&symbol, price * (1.0 + pct / 100.0), pct);
    }
}

/// Owner of a running updater task
pub struct UpdaterHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl UpdaterHandle {
    /// Stop the updater and wait until the task has exited.
    /// No quote is mutated once this returns.
    pub async fn cancel(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Err(e) = (&mut self.task).await {
            if !e.is_cancelled() {
                warn!("Price updater task failed: {}", e);
            }
        }
        info!("Price updater stopped");
    }
}

impl Drop for UpdaterHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn the updater. The first tick fires one full `period` after start.
pub fn spawn_price_updater<R>(state: Arc<AppState>, period: Duration, mut rng: R) -> UpdaterHandle
where
    R: Rng + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = interval.tick() => {
                    let quotes = {
                        let mut store = state.store.write().await;
                        tick(&mut *store, &mut rng);
                        store.quotes().clone()
                    };
                    debug!("Price tick applied to {} quotes", quotes.len());
                    state.publish(WsMessage::Quotes { quotes });
                }
            }
        }
    });

    info!("Price updater started ({:?} interval)", period);

    UpdaterHandle {
        shutdown: Some(shutdown_tx),
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeskConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_draw_percent_in_open_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10_000 {
            let pct = draw_percent(&mut rng);
            assert!(pct > -1.0 && pct < 1.0, "pct {}", pct);
        }
    }

    #[test]
    fn test_tick_moves_every_quote_within_one_percent() {
        let mut store = TradingStore::initialized();
        let before = store.quotes().clone();
        let mut rng = StdRng::seed_from_u64(2);

        tick(&mut store, &mut rng);

        for (symbol, old) in &before {
            let new = &store.quotes()[symbol];
            let expected = old.price * (1.0 + new.percent_change / 100.0);
            assert!((new.price - expected).abs() < 1e-9);
            assert!(new.percent_change.abs() < 1.0);
            assert_eq!(new.volume, old.volume);
        }
    }

    #[test]
    fn test_prices_stay_positive() {
        let mut store = TradingStore::initialized();
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..5_000 {
            tick(&mut store, &mut rng);
            assert!(store.quotes().values().all(|q| q.price > 0.0));
        }
    }

    #[test]
    fn test_tick_on_empty_store_is_noop() {
        let mut store = TradingStore::new();
        let mut rng = StdRng::seed_from_u64(4);
        tick(&mut store, &mut rng);
        assert!(store.quotes().is_empty());
    }

    #[tokio::test]
    async fn test_updater_mutates_quotes() {
        let state = Arc::new(AppState::new(DeskConfig::default()));
        let seed = state.store.read().await.quotes().clone();
        let mut rx = state.tx.subscribe();

        let handle = spawn_price_updater(state.clone(), Duration::from_millis(10), StdRng::seed_from_u64(5));
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(msg, Ok(Ok(WsMessage::Quotes { .. }))));
        handle.cancel().await;

        assert_ne!(state.store.read().await.quotes(), &seed);
    }

    #[tokio::test]
    async fn test_cancel_stops_mutations() {
        let period = Duration::from_millis(10);
        let state = Arc::new(AppState::new(DeskConfig::default()));

        let handle = spawn_price_updater(state.clone(), period, StdRng::seed_from_u64(6));
        tokio::time::sleep(period * 5).await;
        handle.cancel().await;

        let before = state.store.read().await.snapshot();
        tokio::time::sleep(period * 5).await;
        let after = state.store.read().await.snapshot();

        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let period = Duration::from_millis(10);
        let state = Arc::new(AppState::new(DeskConfig::default()));

        let handle = spawn_price_updater(state.clone(), period, StdRng::seed_from_u64(8));
        drop(handle);
        // Let the runtime process the abort
        tokio::time::sleep(period).await;

        let before = state.store.read().await.snapshot();
        tokio::time::sleep(period * 5).await;
        assert_eq!(state.store.read().await.snapshot(), before);
    }
}
