use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::SimConfig,
    error::MarketError,
    generators::{round_to_cents, PriceGenerator},
    history::{HistorySample, HistoryWindow},
};

/// Static identity and metadata of a rostered instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub name: String,
    pub baseline_price: f64,
    pub baseline_volume: u64,
    pub market_cap: String,
}

impl Instrument {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        baseline_price: f64,
        baseline_volume: u64,
        market_cap: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            baseline_price,
            baseline_volume,
            market_cap: market_cap.into(),
        }
    }

    pub fn validate(&self) -> Result<(), MarketError> {
        if self.symbol.trim().is_empty() {
            return Err(MarketError::InvalidInstrumentDefinition {
                symbol: self.symbol.clone(),
                reason: "symbol must not be blank",
            });
        }
        if !self.baseline_price.is_finite() || self.baseline_price <= 0.0 {
            return Err(MarketError::InvalidInstrumentDefinition {
                symbol: self.symbol.clone(),
                reason: "baseline price must be finite and positive",
            });
        }

        Ok(())
    }
}

/// One instrument's price, derived change metrics and history at a single tick.
///
/// Values are never mutated after construction; advancing produces a new state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentState {
    #[serde(flatten)]
    instrument: Arc<Instrument>,
    price: f64,
    change: f64,
    change_percent: f64,
    ticks: u64,
    history: HistoryWindow,
}

impl InstrumentState {
    pub fn seed<R: Rng + ?Sized>(
        instrument: Arc<Instrument>,
        config: &SimConfig,
        generator: &PriceGenerator,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<Self, MarketError> {
        let history =
            HistoryWindow::seed(instrument.baseline_price, config, generator, now_ms, rng)?;
        let price = instrument.baseline_price;

        Self::from_parts(instrument, price, history)
    }

    pub fn from_parts(
        instrument: Arc<Instrument>,
        price: f64,
        history: HistoryWindow,
    ) -> Result<Self, MarketError> {
        let (change, change_percent) = change_metrics(&instrument.symbol, price, history.open())?;

        Ok(Self {
            instrument,
            price,
            change,
            change_percent,
            ticks: 0,
            history,
        })
    }

    /// Walks the price one step and returns the resulting state.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        generator: &PriceGenerator,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<Self, MarketError> {
        let next = generator.next_price(self.price, rng);
        self.advanced_to(next, now_ms)
    }

    /// Records `next` as the new price at `now_ms` and recomputes change
    /// metrics against the open of the updated window.
    pub fn advanced_to(&self, next: f64, now_ms: u64) -> Result<Self, MarketError> {
        // keep the window strictly chronological even if the clock stalls
        let timestamp_ms = now_ms.max(self.history.latest().timestamp_ms.saturating_add(1));
        let history = self
            .history
            .appended(HistorySample::new(timestamp_ms, next))?;
        let (change, change_percent) = change_metrics(&self.instrument.symbol, next, history.open())?;

        Ok(Self {
            instrument: Arc::clone(&self.instrument),
            price: next,
            change,
            change_percent,
            ticks: self.ticks + 1,
            history,
        })
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn symbol(&self) -> &str {
        &self.instrument.symbol
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn change(&self) -> f64 {
        self.change
    }

    pub fn change_percent(&self) -> f64 {
        self.change_percent
    }

    /// Number of advances applied since seeding.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }
}

fn change_metrics(symbol: &str, price: f64, open: f64) -> Result<(f64, f64), MarketError> {
    let diff = price - open;
    let percent = diff / open * 100.0;
    if open == 0.0 || !percent.is_finite() {
        return Err(MarketError::UndefinedChangePercent {
            symbol: symbol.to_owned(),
        });
    }

    Ok((round_to_cents(diff), round_to_cents(percent)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    use super::{Instrument, InstrumentState};
    use crate::{
        config::SimConfig,
        error::MarketError,
        generators::{round_to_cents, PriceGenerator},
        history::{HistorySample, HistoryWindow},
    };

    fn aapl() -> Arc<Instrument> {
        Arc::new(Instrument::new("AAPL", "Apple Inc.", 175.43, 54_300_000, "2.7T"))
    }

    fn flat_history(prices: &[f64]) -> HistoryWindow {
        HistoryWindow::from_samples(
            prices.len(),
            prices
                .iter()
                .enumerate()
                .map(|(index, price)| HistorySample::new(1_000 + index as u64, *price)),
        )
        .unwrap()
    }

    #[test]
    fn seeded_state_starts_at_baseline_with_consistent_metrics() {
        let mut rng = StdRng::seed_from_u64(21);
        let state = InstrumentState::seed(
            aapl(),
            &SimConfig::default(),
            &PriceGenerator::default(),
            50_000_000,
            &mut rng,
        )
        .unwrap();

        let open = state.history().open();
        assert_eq!(state.price(), 175.43);
        assert_eq!(state.ticks(), 0);
        assert_eq!(state.change(), round_to_cents(175.43 - open));
        assert_eq!(
            state.change_percent(),
            round_to_cents((175.43 - open) / open * 100.0)
        );
    }

    #[test]
    fn advanced_to_recomputes_against_post_append_open() {
        let state =
            InstrumentState::from_parts(aapl(), 12.0, flat_history(&[10.0, 11.0, 12.0])).unwrap();

        let next = state.advanced_to(13.0, 5_000).unwrap();

        // 10.0 was evicted, so the open is now 11.0
        assert_eq!(next.history().open(), 11.0);
        assert_eq!(next.change(), 2.0);
        assert_eq!(next.change_percent(), 18.18);
        assert_eq!(next.ticks(), 1);
        assert_eq!(next.history().len(), 3);

        // prior state is untouched
        assert_eq!(state.price(), 12.0);
        assert_eq!(state.history().open(), 10.0);
    }

    #[test]
    fn stalled_clock_still_advances_timestamps() {
        let state = InstrumentState::from_parts(aapl(), 10.0, flat_history(&[10.0])).unwrap();

        let next = state.advanced_to(10.1, 0).unwrap();

        assert_eq!(next.history().latest().timestamp_ms, 1_001);
    }

    #[test]
    fn zero_open_is_a_computation_error() {
        let err = InstrumentState::from_parts(aapl(), 1.0, flat_history(&[0.0])).unwrap_err();

        assert_eq!(
            err,
            MarketError::UndefinedChangePercent {
                symbol: "AAPL".to_string()
            }
        );
    }

    #[test]
    fn advance_walks_within_band() {
        let mut rng = StdRng::seed_from_u64(4);
        let state =
            InstrumentState::from_parts(aapl(), 175.43, flat_history(&[175.0, 175.43])).unwrap();

        let next = state
            .advance(&PriceGenerator::default(), 2_000, &mut rng)
            .unwrap();

        assert!((next.price() - 175.43).abs() <= 175.43 * 0.002 + 0.005);
        assert_eq!(next.history().latest().price, next.price());
    }

    #[test]
    fn rejects_blank_symbol_and_bad_baseline() {
        let blank = Instrument::new(" ", "Nameless", 1.0, 0, "0");
        let negative = Instrument::new("NEG", "Negative", -1.0, 0, "0");

        assert!(matches!(
            blank.validate(),
            Err(MarketError::InvalidInstrumentDefinition { .. })
        ));
        assert!(matches!(
            negative.validate(),
            Err(MarketError::InvalidInstrumentDefinition { .. })
        ));
    }

    #[test]
    fn state_serializes_identity_inline() {
        let state = InstrumentState::from_parts(aapl(), 10.0, flat_history(&[10.0])).unwrap();

        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["symbol"], json!("AAPL"));
        assert_eq!(json["market_cap"], json!("2.7T"));
        assert_eq!(json["price"], json!(10.0));
        assert_eq!(json["change_percent"], json!(0.0));
        assert_eq!(json["history"]["samples"][0]["timestamp_ms"], json!(1_000));
    }
}
