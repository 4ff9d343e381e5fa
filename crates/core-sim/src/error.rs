use thiserror::Error;

/// All errors generated by the market simulation core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    #[error("unknown instrument: {0}")]
    InvalidInstrument(String),

    #[error("change percent is undefined for {symbol}: window open price is zero")]
    UndefinedChangePercent { symbol: String },

    #[error("history window must hold at least one sample")]
    EmptyHistory,

    #[error("history samples must be strictly chronological")]
    UnorderedHistory,

    #[error("instrument roster is empty")]
    EmptyRoster,

    #[error("duplicate instrument symbol in roster: {0}")]
    DuplicateSymbol(String),

    #[error("invalid instrument definition for {symbol}: {reason}")]
    InvalidInstrumentDefinition {
        symbol: String,
        reason: &'static str,
    },

    #[error("invalid simulation config: {0}")]
    InvalidConfig(&'static str),
}
