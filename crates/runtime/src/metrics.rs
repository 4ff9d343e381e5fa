use std::collections::VecDeque;

use serde::Serialize;

/// Number of most recent latencies kept for percentile reporting.
pub const DEFAULT_LATENCY_WINDOW: usize = 4_096;

/// Percentiles over the retained window; `count` is every latency ever recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatencyPercentiles {
    pub count: u64,
    pub window: usize,
    pub p50_micros: u64,
    pub p90_micros: u64,
    pub p95_micros: u64,
    pub p99_micros: u64,
    pub max_micros: u64,
}

/// Wall-clock cost of each `advance_all`, in microseconds.
///
/// Only the newest `window` latencies are retained.
#[derive(Debug, Clone)]
pub struct TickLatencyMetrics {
    window: usize,
    recorded: u64,
    latencies_micros: VecDeque<u64>,
}

impl Default for TickLatencyMetrics {
    fn default() -> Self {
        Self::with_window(DEFAULT_LATENCY_WINDOW)
    }
}

impl TickLatencyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            recorded: 0,
            latencies_micros: VecDeque::with_capacity(window),
        }
    }

    pub fn record_latency_micros(&mut self, latency_micros: u64) {
        if self.latencies_micros.len() == self.window {
            self.latencies_micros.pop_front();
        }
        self.latencies_micros.push_back(latency_micros);
        self.recorded += 1;
    }

    /// Total latencies recorded, including those evicted from the window.
    pub fn count(&self) -> u64 {
        self.recorded
    }

    pub fn retained(&self) -> usize {
        self.latencies_micros.len()
    }

    pub fn percentiles(&self) -> Option<LatencyPercentiles> {
        if self.latencies_micros.is_empty() {
            return None;
        }

        let mut sorted: Vec<u64> = self.latencies_micros.iter().copied().collect();
        sorted.sort_unstable();
        let window = sorted.len();

        Some(LatencyPercentiles {
            count: self.recorded,
            window,
            p50_micros: percentile_nearest_rank(&sorted, 50),
            p90_micros: percentile_nearest_rank(&sorted, 90),
            p95_micros: percentile_nearest_rank(&sorted, 95),
            p99_micros: percentile_nearest_rank(&sorted, 99),
            max_micros: sorted[window - 1],
        })
    }
}

fn percentile_nearest_rank(sorted: &[u64], percentile: usize) -> u64 {
    let count = sorted.len();
    let rank = (percentile * count).div_ceil(100);
    sorted[rank.saturating_sub(1)]
}

#[cfg(test)]
mod tests {
    use super::TickLatencyMetrics;

    #[test]
    fn latency_percentiles_are_reported() {
        let mut metrics = TickLatencyMetrics::new();

        metrics.record_latency_micros(1);
        metrics.record_latency_micros(2);
        metrics.record_latency_micros(3);
        metrics.record_latency_micros(4);
        metrics.record_latency_micros(100);

        let report = metrics.percentiles().expect("percentiles should exist");

        assert_eq!(report.count, 5);
        assert_eq!(report.window, 5);
        assert_eq!(report.p50_micros, 3);
        assert_eq!(report.p95_micros, 100);
        assert_eq!(report.p99_micros, 100);
        assert_eq!(report.max_micros, 100);
    }

    #[test]
    fn window_stays_bounded_while_count_keeps_growing() {
        let mut metrics = TickLatencyMetrics::with_window(100);

        for latency in 1..=10_000_u64 {
            metrics.record_latency_micros(latency);
        }

        assert_eq!(metrics.count(), 10_000);
        assert_eq!(metrics.retained(), 100);
        assert!(metrics.latencies_micros.capacity() < 1_000);

        let report = metrics.percentiles().expect("percentiles should exist");
        assert_eq!(report.count, 10_000);
        assert_eq!(report.window, 100);
        assert_eq!(report.p50_micros, 9_950);
        assert_eq!(report.max_micros, 10_000);
    }

    #[test]
    fn empty_metrics_report_nothing() {
        assert!(TickLatencyMetrics::new().percentiles().is_none());
    }
}
