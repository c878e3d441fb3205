/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Domain order model.
//!
//! These types are what the trading application hands to the adapter. They
//! carry no FIX knowledge; [`crate::mapper`] and [`crate::encoder`] translate
//! them.

use fixlink_core::types::{OrdType, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument class of a domain symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityType {
    /// Common stock.
    Equity,
    /// Listed option.
    Option,
    /// Listed future.
    Future,
    /// Spot foreign exchange pair.
    Forex,
    /// Crypto pair.
    Crypto,
    /// Index; not tradable.
    Index,
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equity => "Equity",
            Self::Option => "Option",
            Self::Future => "Future",
            Self::Forex => "Forex",
            Self::Crypto => "Crypto",
            Self::Index => "Index",
        };
        f.write_str(name)
    }
}

/// Domain instrument identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// Ticker as the trading application knows it.
    pub ticker: String,
    /// Instrument class.
    pub security_type: SecurityType,
}

impl Symbol {
    /// Creates a symbol.
    #[must_use]
    pub fn new(ticker: impl Into<String>, security_type: SecurityType) -> Self {
        Self {
            ticker: ticker.into(),
            security_type,
        }
    }

    /// Creates an equity symbol.
    #[must_use]
    pub fn equity(ticker: impl Into<String>) -> Self {
        Self::new(ticker, SecurityType::Equity)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ticker, self.security_type)
    }
}

/// Direction of a domain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Buy.
    Buy,
    /// Sell.
    Sell,
}

impl From<OrderDirection> for Side {
    fn from(direction: OrderDirection) -> Self {
        match direction {
            OrderDirection::Buy => Self::Buy,
            OrderDirection::Sell => Self::Sell,
        }
    }
}

/// Order kind with its kind-specific prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Market order.
    Market,
    /// Limit order.
    Limit {
        /// Limit price.
        limit_price: Decimal,
    },
    /// Stop order that becomes a market order when triggered.
    StopMarket {
        /// Trigger price.
        stop_price: Decimal,
    },
    /// Stop order that becomes a limit order when triggered.
    StopLimit {
        /// Trigger price.
        stop_price: Decimal,
        /// Limit price after triggering.
        limit_price: Decimal,
    },
    /// Market order executed at the open.
    MarketOnOpen,
    /// Market order executed at the close.
    MarketOnClose,
    /// Limit order that activates once the trigger price is touched.
    LimitIfTouched {
        /// Trigger price.
        trigger_price: Decimal,
        /// Limit price after triggering.
        limit_price: Decimal,
    },
    /// Stop that trails the market by a fixed amount.
    TrailingStop {
        /// Trailing distance.
        trailing_amount: Decimal,
    },
}

impl OrderKind {
    /// Returns the FIX OrdType for kinds the broker session supports.
    #[must_use]
    pub const fn ord_type(&self) -> Option<OrdType> {
        match self {
            Self::Market => Some(OrdType::Market),
            Self::Limit { .. } => Some(OrdType::Limit),
            Self::StopMarket { .. } => Some(OrdType::Stop),
            Self::StopLimit { .. } => Some(OrdType::StopLimit),
            Self::MarketOnOpen
            | Self::MarketOnClose
            | Self::LimitIfTouched { .. }
            | Self::TrailingStop { .. } => None,
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Limit { .. } => "Limit",
            Self::StopMarket { .. } => "StopMarket",
            Self::StopLimit { .. } => "StopLimit",
            Self::MarketOnOpen => "MarketOnOpen",
            Self::MarketOnClose => "MarketOnClose",
            Self::LimitIfTouched { .. } => "LimitIfTouched",
            Self::TrailingStop { .. } => "TrailingStop",
        }
    }
}

/// Order intent produced by the trading application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainOrder {
    /// Application order id; becomes ClOrdID.
    pub id: String,
    /// Instrument.
    pub symbol: Symbol,
    /// Buy or sell.
    pub direction: OrderDirection,
    /// Absolute quantity.
    pub quantity: Decimal,
    /// Kind and kind-specific prices.
    pub kind: OrderKind,
}

impl DomainOrder {
    /// Creates an order.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        symbol: Symbol,
        direction: OrderDirection,
        quantity: Decimal,
        kind: OrderKind,
    ) -> Self {
        Self {
            id: id.into(),
            symbol,
            direction,
            quantity,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ord_type_per_kind() {
        assert_eq!(OrderKind::Market.ord_type(), Some(OrdType::Market));
        assert_eq!(
            OrderKind::StopLimit {
                stop_price: dec!(10),
                limit_price: dec!(9)
            }
            .ord_type(),
            Some(OrdType::StopLimit)
        );
        assert_eq!(OrderKind::MarketOnClose.ord_type(), None);
        assert_eq!(
            OrderKind::TrailingStop {
                trailing_amount: dec!(1)
            }
            .ord_type(),
            None
        );
    }

    #[test]
    fn test_direction_to_side() {
        assert_eq!(Side::from(OrderDirection::Buy), Side::Buy);
        assert_eq!(Side::from(OrderDirection::Sell), Side::Sell);
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::equity("aapl").to_string(), "aapl (Equity)");
    }
}
