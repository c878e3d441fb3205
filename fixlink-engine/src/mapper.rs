/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Domain symbol to broker ticker mapping.

use crate::order::{SecurityType, Symbol};
use fixlink_core::error::OrderError;
use std::collections::HashMap;

/// Quote currencies recognised when splitting a concatenated pair.
///
/// Longer codes come first so `BTCUSDT` splits as `BTC/USDT`, not `BTCU/SDT`.
const QUOTE_CURRENCIES: &[&str] = &[
    "USDT", "USDC", "USD", "EUR", "GBP", "JPY", "CHF", "CAD", "AUD", "NZD", "BTC", "ETH",
];

/// Broker-facing representation of a domain symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSymbol {
    /// Value for Symbol (55).
    pub ticker: String,
    /// Value for SecurityType (167).
    pub security_type: &'static str,
}

/// Maps domain symbols to broker tickers and security type codes.
///
/// Pure lookup: overrides first, then per-class rules.
#[derive(Debug, Clone, Default)]
pub struct SymbolMapper {
    overrides: HashMap<String, String>,
}

impl SymbolMapper {
    /// Creates a mapper without overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an explicit domain ticker to broker ticker mapping.
    #[must_use]
    pub fn with_override(mut self, domain: impl Into<String>, broker: impl Into<String>) -> Self {
        self.overrides.insert(domain.into(), broker.into());
        self
    }

    /// Maps a domain symbol.
    ///
    /// # Errors
    /// Returns `OrderError::UnmappedSymbol` for index and empty tickers, and
    /// for currency pairs whose quote currency is not recognised.
    pub fn map(&self, symbol: &Symbol) -> Result<MappedSymbol, OrderError> {
        let security_type = security_type_code(symbol)?;
        let ticker = match self.overrides.get(&symbol.ticker) {
            Some(broker) => broker.clone(),
            None => broker_ticker(symbol)?,
        };
        Ok(MappedSymbol {
            ticker,
            security_type,
        })
    }
}

/// Returns the FIX SecurityType code for the symbol's class.
///
/// # Errors
/// Returns `OrderError::UnmappedSymbol` for indices.
pub fn security_type_code(symbol: &Symbol) -> Result<&'static str, OrderError> {
    match symbol.security_type {
        SecurityType::Equity => Ok("CS"),
        SecurityType::Option => Ok("OPT"),
        SecurityType::Future => Ok("FUT"),
        SecurityType::Forex => Ok("FOR"),
        SecurityType::Crypto => Ok("CRYPTO"),
        SecurityType::Index => Err(unmapped(symbol, "index instruments are not tradable")),
    }
}

fn broker_ticker(symbol: &Symbol) -> Result<String, OrderError> {
    let ticker = symbol.ticker.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err(unmapped(symbol, "empty ticker"));
    }
    match symbol.security_type {
        SecurityType::Forex | SecurityType::Crypto => split_pair(&ticker)
            .ok_or_else(|| unmapped(symbol, "unrecognised quote currency")),
        _ => Ok(ticker),
    }
}

fn split_pair(ticker: &str) -> Option<String> {
    if ticker.contains('/') {
        return Some(ticker.to_string());
    }
    QUOTE_CURRENCIES.iter().find_map(|quote| {
        let base = ticker.strip_suffix(quote)?;
        (base.len() >= 2).then(|| format!("{base}/{quote}"))
    })
}

fn unmapped(symbol: &Symbol, reason: &str) -> OrderError {
    OrderError::UnmappedSymbol {
        symbol: symbol.ticker.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equity_is_upper_cased() {
        let mapped = SymbolMapper::new().map(&Symbol::equity("aapl")).unwrap();
        assert_eq!(mapped.ticker, "AAPL");
        assert_eq!(mapped.security_type, "CS");
    }

    #[test]
    fn test_pairs_are_split() {
        let mapper = SymbolMapper::new();
        let fx = mapper.map(&Symbol::new("eurusd", SecurityType::Forex)).unwrap();
        assert_eq!(fx.ticker, "EUR/USD");
        assert_eq!(fx.security_type, "FOR");

        let crypto = mapper
            .map(&Symbol::new("BTCUSDT", SecurityType::Crypto))
            .unwrap();
        assert_eq!(crypto.ticker, "BTC/USDT");
        assert_eq!(crypto.security_type, "CRYPTO");

        let slashed = mapper
            .map(&Symbol::new("ETH/BTC", SecurityType::Crypto))
            .unwrap();
        assert_eq!(slashed.ticker, "ETH/BTC");
    }

    #[test]
    fn test_override_wins() {
        let mapper = SymbolMapper::new().with_override("BRK.B", "BRK B");
        let mapped = mapper.map(&Symbol::equity("BRK.B")).unwrap();
        assert_eq!(mapped.ticker, "BRK B");
    }

    #[test]
    fn test_unmapped_symbols() {
        let mapper = SymbolMapper::new();
        assert!(matches!(
            mapper.map(&Symbol::new("SPX", SecurityType::Index)),
            Err(OrderError::UnmappedSymbol { .. })
        ));
        assert!(matches!(
            mapper.map(&Symbol::equity("  ")),
            Err(OrderError::UnmappedSymbol { .. })
        ));
        assert!(matches!(
            mapper.map(&Symbol::new("EURXYZ", SecurityType::Forex)),
            Err(OrderError::UnmappedSymbol { .. })
        ));
    }
}
