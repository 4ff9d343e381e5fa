mod clock;
mod config;
mod error;
mod generators;
mod history;
mod instrument;
mod registry;
mod roster;

pub use clock::now_ms;
pub use config::SimConfig;
pub use error::MarketError;
pub use generators::{round_to_cents, PriceGenerator};
pub use history::{HistorySample, HistoryWindow};
pub use instrument::{Instrument, InstrumentState};
pub use registry::{MarketRegistry, MarketSnapshot};
pub use roster::default_roster;

#[cfg(test)]
mod tests {
    use super::{default_roster, MarketRegistry, SimConfig};

    #[test]
    fn sim_config_defaults_match_reference_cadence() {
        let config = SimConfig::default();
        assert_eq!(config.volatility, 0.002);
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.seed_samples, 20);
        assert_eq!(config.seed_spread, 0.01);
        assert_eq!(config.seed_spacing.as_secs(), 60);
        assert_eq!(config.price_floor, 0.01);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn registry_boots_from_default_roster() {
        let registry = MarketRegistry::new(default_roster(), SimConfig::default()).unwrap();
        let snapshot = registry.snapshot();

        assert_eq!(snapshot.len(), 6);
        assert_eq!(snapshot.tick(), 0);
        assert_eq!(snapshot.first().map(|state| state.symbol()), Some("AAPL"));
    }
}
