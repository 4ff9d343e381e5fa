use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::{
    sync::oneshot,
    task::{JoinError, JoinHandle},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    engine::MarketEngine,
    events::TickStage,
    metrics::LatencyPercentiles,
};

pub const DEFAULT_ADVANCE_PERIOD: Duration = Duration::from_millis(1_500);
pub const DEFAULT_DISPLAY_REFRESH_PERIOD: Duration = Duration::from_millis(1_000);

/// Market and display cadences. Only `advance_period` drives the scheduler;
/// the display period is carried for consumers that redraw on their own clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceConfig {
    pub advance_period: Duration,
    pub display_refresh_period: Duration,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            advance_period: DEFAULT_ADVANCE_PERIOD,
            display_refresh_period: DEFAULT_DISPLAY_REFRESH_PERIOD,
        }
    }
}

impl CadenceConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.advance_period.is_zero() {
            return Err(SchedulerError::InvalidCadence(
                "advance period must be non-zero",
            ));
        }
        if self.display_refresh_period.is_zero() {
            return Err(SchedulerError::InvalidCadence(
                "display refresh period must be non-zero",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cadence: {0}")]
    InvalidCadence(&'static str),

    #[error("scheduler task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerReport {
    pub ticks: u64,
    pub failed_ticks: u64,
    pub latency: Option<LatencyPercentiles>,
}

/// Drives a [`MarketEngine`] on a fixed period until stopped.
pub struct TickScheduler;

impl TickScheduler {
    /// Spawns the tick loop onto the current tokio runtime. The first advance
    /// happens one full period after spawning.
    pub fn spawn(
        engine: MarketEngine,
        cadence: CadenceConfig,
    ) -> Result<SchedulerHandle, SchedulerError> {
        cadence.validate()?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run(engine, cadence.advance_period, stop_rx));

        Ok(SchedulerHandle {
            stop_tx,
            task,
            cadence,
        })
    }
}

/// Owner of a running tick loop. Dropping the handle cancels the loop.
pub struct SchedulerHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<SchedulerReport>,
    cadence: CadenceConfig,
}

impl SchedulerHandle {
    pub fn cadence(&self) -> CadenceConfig {
        self.cadence
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the loop and waits for it to exit. A tick already in progress
    /// completes first; once this returns nothing further is published.
    pub async fn stop(self) -> Result<SchedulerReport, SchedulerError> {
        let Self { stop_tx, task, .. } = self;
        // the loop may already have exited, in which case the receiver is gone
        let _ = stop_tx.send(());

        Ok(task.await?)
    }
}

async fn run(
    mut engine: MarketEngine,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> SchedulerReport {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(period_ms = period.as_millis() as u64, "tick scheduler started");

    let mut ticks = 0_u64;
    let mut failed_ticks = 0_u64;
    loop {
        tokio::select! {
            biased;
            // an explicit stop and a dropped handle both end the loop
            _ = &mut stop_rx => break,
            _ = interval.tick() => {
                let events = engine.step_once();
                ticks += 1;
                if events.iter().any(|event| event.stage == TickStage::AdvanceFailed) {
                    failed_ticks += 1;
                }
                debug!(ticks, "tick completed");
            }
        }
    }

    let report = SchedulerReport {
        ticks,
        failed_ticks,
        latency: engine.metrics().percentiles(),
    };
    info!(
        ticks = report.ticks,
        failed_ticks = report.failed_ticks,
        "tick scheduler stopped"
    );

    report
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::{
        sync::broadcast::error::{RecvError, TryRecvError},
        time::{self, Instant},
    };

    use super::{CadenceConfig, SchedulerError, TickScheduler};
    use crate::engine::MarketEngine;

    fn cadence(period_ms: u64) -> CadenceConfig {
        CadenceConfig {
            advance_period: Duration::from_millis(period_ms),
            ..CadenceConfig::default()
        }
    }

    #[test]
    fn default_cadence_matches_reference_periods() {
        let cadence = CadenceConfig::default();

        assert_eq!(cadence.advance_period, Duration::from_millis(1_500));
        assert_eq!(cadence.display_refresh_period, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn first_advance_waits_one_full_period() {
        let engine = MarketEngine::for_test_seed(1);
        let mut snapshots = engine.subscribe();
        let started = Instant::now();

        let handle = TickScheduler::spawn(engine, cadence(1_500)).unwrap();
        let first = snapshots.recv().await.unwrap();

        assert_eq!(first.tick(), 1);
        assert!(started.elapsed() >= Duration::from_millis(1_500));
        handle.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_consecutive_snapshots() {
        let engine = MarketEngine::for_test_seed(2);
        let mut snapshots = engine.subscribe();

        let handle = TickScheduler::spawn(engine, cadence(100)).unwrap();
        for expected in 1..=5_u64 {
            let snapshot = snapshots.recv().await.unwrap();
            assert_eq!(snapshot.tick(), expected);
        }

        let report = handle.stop().await.unwrap();
        assert!(report.ticks >= 5);
        assert_eq!(report.failed_ticks, 0);
        assert!(report.latency.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_published_after_stop_returns() {
        let engine = MarketEngine::for_test_seed(3);
        let registry = Arc::clone(engine.registry());
        let mut snapshots = engine.subscribe();

        let handle = TickScheduler::spawn(engine, cadence(100)).unwrap();
        snapshots.recv().await.unwrap();
        snapshots.recv().await.unwrap();

        let report = handle.stop().await.unwrap();
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(registry.snapshot().tick(), report.ticks);
        loop {
            match snapshots.try_recv() {
                Ok(snapshot) => assert!(snapshot.tick() <= report.ticks),
                Err(TryRecvError::Closed) => break,
                Err(other) => panic!("unexpected receive state: {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_loop() {
        let engine = MarketEngine::for_test_seed(4);
        let registry = Arc::clone(engine.registry());
        let mut snapshots = engine.subscribe();

        let handle = TickScheduler::spawn(engine, cadence(100)).unwrap();
        drop(handle);
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(registry.snapshot().tick(), 0);
        assert!(matches!(snapshots.recv().await, Err(RecvError::Closed)));
    }

    #[tokio::test]
    async fn rejects_zero_periods() {
        let zero_advance = TickScheduler::spawn(MarketEngine::for_test_seed(5), cadence(0));
        let zero_display = TickScheduler::spawn(
            MarketEngine::for_test_seed(5),
            CadenceConfig {
                display_refresh_period: Duration::ZERO,
                ..CadenceConfig::default()
            },
        );

        assert!(matches!(zero_advance, Err(SchedulerError::InvalidCadence(_))));
        assert!(matches!(zero_display, Err(SchedulerError::InvalidCadence(_))));
    }
}
