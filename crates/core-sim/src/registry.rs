use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::{
    clock::now_ms,
    config::SimConfig,
    error::MarketError,
    generators::PriceGenerator,
    instrument::{Instrument, InstrumentState},
};

/// Every rostered instrument at one tick, in roster order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    tick: u64,
    taken_at_ms: u64,
    instruments: Vec<InstrumentState>,
}

impl MarketSnapshot {
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn taken_at_ms(&self) -> u64 {
        self.taken_at_ms
    }

    pub fn instruments(&self) -> &[InstrumentState] {
        &self.instruments
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstrumentState> {
        self.instruments.iter()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.instruments.iter().map(InstrumentState::symbol)
    }

    pub fn instrument(&self, symbol: &str) -> Option<&InstrumentState> {
        self.instruments
            .iter()
            .find(|state| state.symbol() == symbol)
    }

    pub fn first(&self) -> Option<&InstrumentState> {
        self.instruments.first()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// Owner of all instrument state.
///
/// Readers get the current [`MarketSnapshot`] behind an `Arc`; an advance
/// builds the complete next snapshot before swapping it in, so a reader sees
/// either every instrument before a tick or every instrument after it.
pub struct MarketRegistry {
    generator: PriceGenerator,
    positions: HashMap<String, usize>,
    // held for the whole advance, which also serialises writers
    rng: Mutex<StdRng>,
    current: RwLock<Arc<MarketSnapshot>>,
}

impl MarketRegistry {
    pub fn new(roster: Vec<Instrument>, config: SimConfig) -> Result<Self, MarketError> {
        Self::new_at(roster, config, now_ms())
    }

    pub fn new_at(
        roster: Vec<Instrument>,
        config: SimConfig,
        now_ms: u64,
    ) -> Result<Self, MarketError> {
        config.validate()?;
        validate_roster(&roster)?;

        let generator = PriceGenerator::from_config(&config)?;
        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let states = roster
            .into_iter()
            .map(|instrument| {
                InstrumentState::seed(Arc::new(instrument), &config, &generator, now_ms, &mut rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            instruments = states.len(),
            history_capacity = config.history_capacity,
            seeded = config.rng_seed.is_some(),
            "market registry initialised"
        );

        Ok(Self::assemble(generator, rng, states, 0, now_ms))
    }

    /// Builds a registry around already-constructed instrument states.
    ///
    /// Every state must use the configured history capacity and sit at the
    /// same tick; the first published snapshot carries that tick.
    pub fn from_states(
        states: Vec<InstrumentState>,
        config: SimConfig,
    ) -> Result<Self, MarketError> {
        config.validate()?;
        let roster: Vec<Instrument> = states
            .iter()
            .map(|state| state.instrument().clone())
            .collect();
        validate_roster(&roster)?;

        if states
            .iter()
            .any(|state| state.history().capacity() != config.history_capacity)
        {
            return Err(MarketError::InvalidConfig(
                "instrument history capacity differs from the configured capacity",
            ));
        }
        let tick = states.first().map(InstrumentState::ticks).unwrap_or_default();
        if states.iter().any(|state| state.ticks() != tick) {
            return Err(MarketError::InvalidConfig(
                "instrument states must all be at the same tick",
            ));
        }

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let taken_at_ms = states
            .iter()
            .map(|state| state.history().latest().timestamp_ms)
            .max()
            .unwrap_or_default();

        Ok(Self::assemble(
            PriceGenerator::from_config(&config)?,
            rng,
            states,
            tick,
            taken_at_ms,
        ))
    }

    fn assemble(
        generator: PriceGenerator,
        rng: StdRng,
        states: Vec<InstrumentState>,
        tick: u64,
        taken_at_ms: u64,
    ) -> Self {
        let positions = states
            .iter()
            .enumerate()
            .map(|(position, state)| (state.symbol().to_owned(), position))
            .collect();

        Self {
            generator,
            positions,
            rng: Mutex::new(rng),
            current: RwLock::new(Arc::new(MarketSnapshot {
                tick,
                taken_at_ms,
                instruments: states,
            })),
        }
    }

    pub fn snapshot(&self) -> Arc<MarketSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn lookup(&self, symbol: &str) -> Result<InstrumentState, MarketError> {
        let position = self
            .positions
            .get(symbol)
            .copied()
            .ok_or_else(|| MarketError::InvalidInstrument(symbol.to_owned()))?;

        Ok(self.snapshot().instruments[position].clone())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn generator(&self) -> &PriceGenerator {
        &self.generator
    }

    pub fn advance_all(&self) -> Result<Arc<MarketSnapshot>, MarketError> {
        self.advance_all_at(now_ms())
    }

    /// Advances every instrument one step and publishes the result as the
    /// current snapshot. On error the current snapshot is left untouched.
    pub fn advance_all_at(&self, now_ms: u64) -> Result<Arc<MarketSnapshot>, MarketError> {
        let mut rng = self.rng.lock();
        let current = self.snapshot();

        let instruments = current
            .instruments
            .iter()
            .map(|state| state.advance(&self.generator, now_ms, &mut *rng))
            .collect::<Result<Vec<_>, _>>()?;

        let next = Arc::new(MarketSnapshot {
            tick: current.tick + 1,
            taken_at_ms: now_ms,
            instruments,
        });
        *self.current.write() = Arc::clone(&next);

        Ok(next)
    }
}

impl std::fmt::Debug for MarketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketRegistry")
            .field("generator", &self.generator)
            .field("tick", &self.snapshot().tick)
            .field("instruments", &self.positions.len())
            .finish()
    }
}

fn validate_roster(roster: &[Instrument]) -> Result<(), MarketError> {
    if roster.is_empty() {
        return Err(MarketError::EmptyRoster);
    }

    let mut seen = HashSet::with_capacity(roster.len());
    for instrument in roster {
        instrument.validate()?;
        if !seen.insert(instrument.symbol.as_str()) {
            return Err(MarketError::DuplicateSymbol(instrument.symbol.clone()));
        }
    }

    Ok(())
}
