use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{config::SimConfig, error::MarketError, generators::PriceGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub timestamp_ms: u64,
    pub price: f64,
}

impl HistorySample {
    pub fn new(timestamp_ms: u64, price: f64) -> Self {
        Self {
            timestamp_ms,
            price,
        }
    }
}

/// Fixed-capacity, oldest-first price history.
///
/// A window always holds at least one sample. The oldest retained sample is
/// the reference ("window open") for change metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryWindow {
    capacity: usize,
    samples: VecDeque<HistorySample>,
}

impl HistoryWindow {
    /// Builds a window from chronological samples, keeping the newest `capacity`.
    pub fn from_samples(
        capacity: usize,
        samples: impl IntoIterator<Item = HistorySample>,
    ) -> Result<Self, MarketError> {
        if capacity == 0 {
            return Err(MarketError::InvalidConfig(
                "history capacity must be at least 1",
            ));
        }

        let mut window: VecDeque<HistorySample> = VecDeque::with_capacity(capacity);
        for sample in samples {
            if window
                .back()
                .is_some_and(|last| sample.timestamp_ms <= last.timestamp_ms)
            {
                return Err(MarketError::UnorderedHistory);
            }
            if window.len() == capacity {
                window.pop_front();
            }
            window.push_back(sample);
        }

        if window.is_empty() {
            return Err(MarketError::EmptyHistory);
        }

        Ok(Self {
            capacity,
            samples: window,
        })
    }

    /// Fabricates `config.seed_samples` jittered samples around `initial`,
    /// spaced `config.seed_spacing` apart with the last one stamped `now_ms`.
    pub fn seed<R: Rng + ?Sized>(
        initial: f64,
        config: &SimConfig,
        generator: &PriceGenerator,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<Self, MarketError> {
        let spacing_ms = u64::try_from(config.seed_spacing.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        let count = config.seed_samples as u64;

        let samples = (0..count).map(|index| {
            let steps_back = count - 1 - index;
            let timestamp_ms = now_ms.saturating_sub(steps_back.saturating_mul(spacing_ms));
            HistorySample::new(
                timestamp_ms,
                generator.jitter(initial, config.seed_spread, rng),
            )
        });

        Self::from_samples(config.history_capacity, samples.collect::<Vec<_>>())
    }

    /// Appends `sample`, evicting and returning the oldest sample when full.
    ///
    /// A sample not strictly newer than the latest one is rejected and the
    /// window is left unchanged.
    pub fn push(&mut self, sample: HistorySample) -> Result<Option<HistorySample>, MarketError> {
        if sample.timestamp_ms <= self.latest().timestamp_ms {
            return Err(MarketError::UnorderedHistory);
        }

        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        Ok(evicted)
    }

    /// Returns a copy of this window with `sample` appended.
    pub fn appended(&self, sample: HistorySample) -> Result<Self, MarketError> {
        let mut next = self.clone();
        next.push(sample)?;
        Ok(next)
    }

    pub fn open(&self) -> f64 {
        self.samples
            .front()
            .map(|sample| sample.price)
            .expect("history window is never empty")
    }

    pub fn latest(&self) -> &HistorySample {
        self.samples
            .back()
            .expect("history window is never empty")
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistorySample> {
        self.samples.iter()
    }
}
