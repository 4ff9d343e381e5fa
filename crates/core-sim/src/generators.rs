use rand::Rng;
use tracing::debug;

use crate::{config::SimConfig, error::MarketError};

/// Bounded random walk over prices quoted at cent granularity.
///
/// The generator holds only its parameters; randomness is supplied by the
/// caller so the same generator can drive any number of instruments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceGenerator {
    volatility: f64,
    floor: f64,
}

impl PriceGenerator {
    pub fn new(volatility: f64, floor: f64) -> Result<Self, MarketError> {
        if !volatility.is_finite() || volatility < 0.0 {
            return Err(MarketError::InvalidConfig(
                "volatility must be finite and non-negative",
            ));
        }
        if !floor.is_finite() || floor <= 0.0 {
            return Err(MarketError::InvalidConfig(
                "price floor must be finite and positive",
            ));
        }

        Ok(Self { volatility, floor })
    }

    pub fn from_config(config: &SimConfig) -> Result<Self, MarketError> {
        Self::new(config.volatility, config.price_floor)
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Draws a uniform move in `[-current * volatility, +current * volatility]`
    /// and returns the rounded result, never below the floor.
    pub fn next_price<R: Rng + ?Sized>(&self, current: f64, rng: &mut R) -> f64 {
        self.perturb(current, self.volatility, rng)
    }

    /// Uniform jitter of `spread` around `baseline`, used to fabricate seed history.
    pub fn jitter<R: Rng + ?Sized>(&self, baseline: f64, spread: f64, rng: &mut R) -> f64 {
        self.perturb(baseline, spread, rng)
    }

    fn perturb<R: Rng + ?Sized>(&self, current: f64, relative: f64, rng: &mut R) -> f64 {
        let max_step = current * relative;
        // NaN or non-positive bounds collapse to a flat step
        let delta = if max_step > 0.0 {
            rng.gen_range(-max_step..=max_step)
        } else {
            0.0
        };

        self.clamp(round_to_cents(current + delta))
    }

    fn clamp(&self, price: f64) -> f64 {
        if price.is_finite() && price >= self.floor {
            return price;
        }

        debug!(price, floor = self.floor, "price clamped to floor");
        self.floor
    }
}

impl Default for PriceGenerator {
    fn default() -> Self {
        let config = SimConfig::default();
        Self {
            volatility: config.volatility,
            floor: config.price_floor,
        }
    }
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
