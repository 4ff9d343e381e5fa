use std::sync::Arc;

use analysis::Analyst;
use core_sim::{MarketRegistry, MarketSnapshot};
use runtime::CadenceConfig;
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StreamEvent {
    Connected {
        tick: u64,
        advance_period_ms: u64,
        display_refresh_ms: u64,
    },
    Snapshot {
        snapshot: Arc<MarketSnapshot>,
    },
}

impl StreamEvent {
    pub fn connected(tick: u64, cadence: CadenceConfig) -> Self {
        Self::Connected {
            tick,
            advance_period_ms: duration_ms(cadence.advance_period),
            display_refresh_ms: duration_ms(cadence.display_refresh_period),
        }
    }

    pub fn snapshot(snapshot: Arc<MarketSnapshot>) -> Self {
        Self::Snapshot { snapshot }
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Clone)]
pub struct AppState {
    registry: Arc<MarketRegistry>,
    snapshots_tx: broadcast::Sender<Arc<MarketSnapshot>>,
    analyst: Analyst,
    cadence: CadenceConfig,
}

impl AppState {
    pub fn new(
        registry: Arc<MarketRegistry>,
        snapshots_tx: broadcast::Sender<Arc<MarketSnapshot>>,
        analyst: Analyst,
        cadence: CadenceConfig,
    ) -> Self {
        Self {
            registry,
            snapshots_tx,
            analyst,
            cadence,
        }
    }

    pub fn registry(&self) -> &MarketRegistry {
        &self.registry
    }

    pub fn analyst(&self) -> &Analyst {
        &self.analyst
    }

    pub fn cadence(&self) -> CadenceConfig {
        self.cadence
    }

    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<Arc<MarketSnapshot>> {
        self.snapshots_tx.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn for_test(provider: Arc<dyn analysis::AdviceProvider>) -> Self {
        let config = core_sim::SimConfig {
            rng_seed: Some(17),
            ..core_sim::SimConfig::default()
        };
        let registry = MarketRegistry::new(core_sim::default_roster(), config).unwrap();
        let (snapshots_tx, _) = broadcast::channel(runtime::SNAPSHOT_CHANNEL_CAPACITY);

        Self::new(
            Arc::new(registry),
            snapshots_tx,
            Analyst::new(provider),
            CadenceConfig::default(),
        )
    }

    #[cfg(test)]
    pub(crate) fn snapshots_tx_for_test(&self) -> broadcast::Sender<Arc<MarketSnapshot>> {
        self.snapshots_tx.clone()
    }

    #[cfg(test)]
    pub(crate) fn registry_handle_for_test(&self) -> Arc<MarketRegistry> {
        Arc::clone(&self.registry)
    }
}
