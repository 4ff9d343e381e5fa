use std::{sync::Arc, time::Duration};

use core_sim::{default_roster, round_to_cents, MarketRegistry, SimConfig};
use runtime::{CadenceConfig, MarketEngine, TickScheduler, SNAPSHOT_CHANNEL_CAPACITY};
use tokio::sync::broadcast;

#[tokio::test(start_paused = true)]
async fn subscribers_see_consistent_ordered_snapshots_until_stop() {
    let config = SimConfig {
        rng_seed: Some(2024),
        ..SimConfig::default()
    };
    let registry = Arc::new(MarketRegistry::new(default_roster(), config).unwrap());
    let (snapshots_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
    let mut display = snapshots_tx.subscribe();
    let mut analysis = snapshots_tx.subscribe();
    let roster: Vec<String> = registry.snapshot().symbols().map(str::to_owned).collect();

    let engine = MarketEngine::new(Arc::clone(&registry), snapshots_tx);
    let handle = TickScheduler::spawn(
        engine,
        CadenceConfig {
            advance_period: Duration::from_millis(1_500),
            display_refresh_period: Duration::from_secs(1),
        },
    )
    .unwrap();

    for expected in 1..=20_u64 {
        let snapshot = display.recv().await.unwrap();
        assert_eq!(snapshot.tick(), expected);
        assert_eq!(snapshot.symbols().collect::<Vec<_>>(), roster);
        for state in snapshot.iter() {
            let open = state.history().open();
            assert!(state.price() > 0.0);
            assert_eq!(state.ticks(), expected);
            assert_eq!(state.history().len(), 20);
            assert_eq!(state.change(), round_to_cents(state.price() - open));
            assert_eq!(
                state.change_percent(),
                round_to_cents((state.price() - open) / open * 100.0)
            );
        }

        let mirrored = analysis.recv().await.unwrap();
        assert!(Arc::ptr_eq(&snapshot, &mirrored));
    }

    let report = handle.stop().await.unwrap();
    assert_eq!(registry.snapshot().tick(), report.ticks);
    assert!(registry.lookup("DOES_NOT_EXIST").is_err());
}
