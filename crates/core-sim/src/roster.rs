use crate::instrument::Instrument;

/// The built-in roster, in display order.
pub fn default_roster() -> Vec<Instrument> {
    vec![
        Instrument::new("AAPL", "Apple Inc.", 175.43, 54_300_000, "2.7T"),
        Instrument::new("GOOGL", "Alphabet Inc.", 138.21, 28_100_000, "1.7T"),
        Instrument::new("MSFT", "Microsoft Corp.", 332.06, 22_400_000, "2.5T"),
        Instrument::new("TSLA", "Tesla Inc.", 242.54, 105_000_000, "780B"),
        Instrument::new("AMZN", "Amazon.com", 145.12, 38_900_000, "1.5T"),
        Instrument::new("NVDA", "NVIDIA Corp.", 460.18, 42_100_000, "1.1T"),
    ]
}

#[cfg(test)]
mod tests {
    use super::default_roster;

    #[test]
    fn default_roster_is_valid_and_ordered() {
        let roster = default_roster();
        let symbols: Vec<&str> = roster.iter().map(|item| item.symbol.as_str()).collect();

        assert_eq!(symbols, vec!["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN", "NVDA"]);
        assert!(roster.iter().all(|item| item.validate().is_ok()));
    }
}
