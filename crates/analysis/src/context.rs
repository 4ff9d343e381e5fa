use core_sim::{InstrumentState, MarketSnapshot};

/// One-line description of the selected instrument handed to the advice provider.
pub fn market_context(state: &InstrumentState) -> String {
    format!(
        "Currently viewing stock: {} ({}). Price: ${:.2}. Day Change: {:.2}%.",
        state.symbol(),
        state.instrument().name,
        state.price(),
        state.change_percent()
    )
}

/// Picks the requested instrument, defaulting to the first in roster order
/// when the symbol is missing or unknown.
pub fn select_instrument<'a>(
    snapshot: &'a MarketSnapshot,
    symbol: Option<&str>,
) -> Option<&'a InstrumentState> {
    symbol
        .and_then(|symbol| snapshot.instrument(symbol))
        .or_else(|| snapshot.first())
}
