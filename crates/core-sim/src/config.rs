use std::time::Duration;

use crate::error::MarketError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Maximum relative move per tick, e.g. 0.002 = +/-0.2%.
    pub volatility: f64,
    pub history_capacity: usize,
    /// Samples generated per instrument at startup. Must not exceed `history_capacity`.
    pub seed_samples: usize,
    /// Relative jitter applied to seeded history around the baseline price.
    pub seed_spread: f64,
    pub seed_spacing: Duration,
    pub price_floor: f64,
    pub rng_seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            volatility: 0.002,
            history_capacity: 20,
            seed_samples: 20,
            seed_spread: 0.01,
            seed_spacing: Duration::from_secs(60),
            price_floor: 0.01,
            rng_seed: None,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), MarketError> {
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(MarketError::InvalidConfig(
                "volatility must be finite and non-negative",
            ));
        }
        if self.history_capacity == 0 {
            return Err(MarketError::InvalidConfig(
                "history capacity must be at least 1",
            ));
        }
        if self.seed_samples == 0 || self.seed_samples > self.history_capacity {
            return Err(MarketError::InvalidConfig(
                "seed samples must be between 1 and the history capacity",
            ));
        }
        if !self.seed_spread.is_finite() || !(0.0..1.0).contains(&self.seed_spread) {
            return Err(MarketError::InvalidConfig(
                "seed spread must be a fraction in [0, 1)",
            ));
        }
        if !self.price_floor.is_finite() || self.price_floor <= 0.0 {
            return Err(MarketError::InvalidConfig(
                "price floor must be finite and positive",
            ));
        }

        Ok(())
    }
}
