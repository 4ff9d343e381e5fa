use std::{sync::Arc, time::Instant};

use core_sim::{default_roster, MarketRegistry, MarketSnapshot, SimConfig};
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::{
    events::{TickEvent, TickStage},
    metrics::TickLatencyMetrics,
};

pub const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// One step of the market loop: advance the registry, then publish.
pub struct MarketEngine {
    registry: Arc<MarketRegistry>,
    snapshots_tx: broadcast::Sender<Arc<MarketSnapshot>>,
    metrics: TickLatencyMetrics,
}

impl MarketEngine {
    pub fn new(
        registry: Arc<MarketRegistry>,
        snapshots_tx: broadcast::Sender<Arc<MarketSnapshot>>,
    ) -> Self {
        Self {
            registry,
            snapshots_tx,
            metrics: TickLatencyMetrics::new(),
        }
    }

    pub fn for_test_seed(seed: u64) -> Self {
        let config = SimConfig {
            rng_seed: Some(seed),
            ..SimConfig::default()
        };
        let registry = MarketRegistry::new(default_roster(), config)
            .expect("default roster must build a registry");
        let (snapshots_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);

        Self::new(Arc::new(registry), snapshots_tx)
    }

    pub fn registry(&self) -> &Arc<MarketRegistry> {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<MarketSnapshot>> {
        self.snapshots_tx.subscribe()
    }

    pub fn metrics(&self) -> &TickLatencyMetrics {
        &self.metrics
    }

    pub fn step_once(&mut self) -> Vec<TickEvent> {
        let tick = self.registry.snapshot().tick() + 1;
        let mut events = vec![TickEvent::new(tick, TickStage::TickStarted)];

        let started = Instant::now();
        let snapshot = match self.registry.advance_all() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(tick, %err, "market advance failed");
                events.push(TickEvent::new(tick, TickStage::AdvanceFailed));
                return events;
            }
        };
        let latency_micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.metrics.record_latency_micros(latency_micros);
        events.push(TickEvent::new(snapshot.tick(), TickStage::PricesAdvanced));

        // no subscribers is fine; the registry still holds the latest cut
        let receivers = self.snapshots_tx.send(Arc::clone(&snapshot)).unwrap_or(0);
        debug!(
            tick = snapshot.tick(),
            receivers, latency_micros, "market snapshot published"
        );
        events.push(TickEvent::new(snapshot.tick(), TickStage::SnapshotPublished));

        events
    }
}
