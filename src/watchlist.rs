//! Ordered set of symbols the user is tracking

/// Insertion-ordered, duplicate-free list of symbols.
/// Symbols are not checked against known quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `symbol` unless already present. Returns true if the list changed.
    pub fn add(&mut self, symbol: &str) -> bool {
        if self.contains(symbol) {
            return false;
        }
        self.symbols.push(symbol.to_string());
        true
    }

    /// Remove `symbol` if present. Returns true if the list changed.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.symbols.len();
        self.symbols.retain(|s| s != symbol);
        self.symbols.len() != before
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Watchlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Watchlist::new();
        for symbol in iter {
            list.add(symbol.as_ref());
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Watchlist {
        ["BTC/USDT", "ETH/USDT", "EUR/USD", "AAPL"].into_iter().collect()
    }

    #[test]
    fn test_add_appends_to_end() {
        let mut list = seeded();
        assert!(list.add("TSLA"));
        assert_eq!(list.symbols().last().map(String::as_str), Some("TSLA"));
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn test_double_add_is_idempotent() {
        let mut list = seeded();
        assert!(list.add("TSLA"));
        let after_first = list.clone();

        assert!(!list.add("TSLA"));
        assert_eq!(list, after_first);
        assert_eq!(list.symbols().iter().filter(|s| *s == "TSLA").count(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut list = seeded();
        let before = list.clone();

        assert!(!list.remove("DOGE/USDT"));
        assert_eq!(list, before);
    }

    #[test]
    fn test_remove_keeps_order_of_rest() {
        let mut list = seeded();
        assert!(list.remove("ETH/USDT"));
        assert_eq!(list.symbols(), &["BTC/USDT", "EUR/USD", "AAPL"]);
    }

    #[test]
    fn test_unknown_symbols_accepted() {
        let mut list = Watchlist::new();
        assert!(list.add("NOT/A/QUOTE"));
        assert!(list.contains("NOT/A/QUOTE"));
    }
}
