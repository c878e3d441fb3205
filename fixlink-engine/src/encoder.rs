/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Domain order to NewOrderSingle encoding.

use crate::mapper::SymbolMapper;
use crate::order::{DomainOrder, OrderKind};
use fixlink_core::error::OrderError;
use fixlink_core::field::tag;
use fixlink_core::message::{FixMessage, MessageFactory, MsgType};
use fixlink_core::types::{HandlInst, Side, Timestamp};
use tracing::{info, warn};

/// Builds NewOrderSingle messages from domain orders.
#[derive(Debug, Clone, Default)]
pub struct OrderEncoder {
    mapper: SymbolMapper,
    factory: MessageFactory,
}

impl OrderEncoder {
    /// Creates an encoder.
    ///
    /// # Arguments
    /// * `mapper` - Symbol mapper for tickers and security types
    /// * `factory` - Message factory of the brokerage session
    #[must_use]
    pub fn new(mapper: SymbolMapper, factory: MessageFactory) -> Self {
        Self { mapper, factory }
    }

    /// Encodes `order` as a NewOrderSingle.
    ///
    /// Unsupported order kinds are not an error: the message is returned
    /// without OrdType (40) and a warning is logged. Callers must check
    /// for OrdType before sending.
    ///
    /// # Errors
    /// Returns `OrderError::UnmappedSymbol` if the symbol has no broker mapping.
    pub fn encode(&self, order: &DomainOrder) -> Result<FixMessage, OrderError> {
        let mapped = self.mapper.map(&order.symbol)?;

        let mut message = self.factory.create(MsgType::NewOrderSingle);
        message.set_field(tag::CL_ORD_ID, &order.id);
        message.set_field(tag::HANDL_INST, HandlInst::AutomatedNoIntervention);
        message.set_field(tag::SIDE, Side::from(order.direction));
        message.set_field(tag::TRANSACT_TIME, Timestamp::now().format_millis());
        message.set_field(tag::ORDER_QTY, order.quantity.normalize());
        message.set_field(tag::SECURITY_TYPE, mapped.security_type);
        message.set_field(tag::SYMBOL, &mapped.ticker);

        match order.kind {
            OrderKind::Limit { limit_price } => {
                message.set_field(tag::PRICE, limit_price.normalize());
            }
            OrderKind::StopMarket { stop_price } => {
                message.set_field(tag::STOP_PX, stop_price.normalize());
            }
            OrderKind::StopLimit {
                stop_price,
                limit_price,
            } => {
                message.set_field(tag::PRICE, limit_price.normalize());
                message.set_field(tag::STOP_PX, stop_price.normalize());
            }
            OrderKind::Market
            | OrderKind::MarketOnOpen
            | OrderKind::MarketOnClose
            | OrderKind::LimitIfTouched { .. }
            | OrderKind::TrailingStop { .. } => {}
        }

        match order.kind.ord_type() {
            Some(ord_type) => {
                message.set_field(tag::ORD_TYPE, ord_type);
                info!(
                    order_id = %order.id,
                    symbol = %mapped.ticker,
                    kind = order.kind.name(),
                    "sending order"
                );
            }
            None => warn!(
                order_id = %order.id,
                kind = order.kind.name(),
                "unsupported order kind, message has no OrdType"
            ),
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{OrderDirection, SecurityType, Symbol};
    use rust_decimal_macros::dec;

    fn order(direction: OrderDirection, kind: OrderKind) -> DomainOrder {
        DomainOrder::new(
            "42",
            Symbol::new("btcusd", SecurityType::Crypto),
            direction,
            dec!(0.01),
            kind,
        )
    }

    #[test]
    fn test_encode_limit() {
        let encoder = OrderEncoder::default();
        let msg = encoder
            .encode(&order(
                OrderDirection::Buy,
                OrderKind::Limit {
                    limit_price: dec!(10000),
                },
            ))
            .unwrap();

        assert_eq!(*msg.msg_type(), MsgType::NewOrderSingle);
        assert_eq!(msg.get_field(tag::ORD_TYPE), Some("2"));
        assert_eq!(msg.get_field(tag::PRICE), Some("10000"));
        assert_eq!(msg.get_field(tag::ORDER_QTY), Some("0.01"));
        assert_eq!(msg.get_field(tag::SIDE), Some("1"));
        assert_eq!(msg.get_field(tag::CL_ORD_ID), Some("42"));
        assert_eq!(msg.get_field(tag::HANDL_INST), Some("1"));
        assert_eq!(msg.get_field(tag::SYMBOL), Some("BTC/USD"));
        assert_eq!(msg.get_field(tag::SECURITY_TYPE), Some("CRYPTO"));
        assert!(msg.get_field(tag::TRANSACT_TIME).is_some());
        assert!(!msg.has_field(tag::STOP_PX));
    }

    #[test]
    fn test_encode_market_omits_prices() {
        let encoder = OrderEncoder::default();
        let msg = encoder
            .encode(&order(OrderDirection::Sell, OrderKind::Market))
            .unwrap();

        assert_eq!(msg.get_field(tag::ORD_TYPE), Some("1"));
        assert_eq!(msg.get_field(tag::ORDER_QTY), Some("0.01"));
        assert_eq!(msg.get_field(tag::SIDE), Some("2"));
        assert!(!msg.has_field(tag::PRICE));
        assert!(!msg.has_field(tag::STOP_PX));
    }

    #[test]
    fn test_encode_stop_kinds() {
        let encoder = OrderEncoder::default();
        let stop = encoder
            .encode(&order(
                OrderDirection::Sell,
                OrderKind::StopMarket {
                    stop_price: dec!(95.50),
                },
            ))
            .unwrap();
        assert_eq!(stop.get_field(tag::ORD_TYPE), Some("3"));
        assert_eq!(stop.get_field(tag::STOP_PX), Some("95.5"));
        assert!(!stop.has_field(tag::PRICE));

        let stop_limit = encoder
            .encode(&order(
                OrderDirection::Sell,
                OrderKind::StopLimit {
                    stop_price: dec!(95),
                    limit_price: dec!(94.75),
                },
            ))
            .unwrap();
        assert_eq!(stop_limit.get_field(tag::ORD_TYPE), Some("4"));
        assert_eq!(stop_limit.get_field(tag::PRICE), Some("94.75"));
        assert_eq!(stop_limit.get_field(tag::STOP_PX), Some("95"));
    }

    #[test]
    fn test_encode_unsupported_kind() {
        let encoder = OrderEncoder::default();
        let msg = encoder
            .encode(&order(
                OrderDirection::Buy,
                OrderKind::TrailingStop {
                    trailing_amount: dec!(2),
                },
            ))
            .unwrap();

        assert!(!msg.has_field(tag::ORD_TYPE));
        assert!(!msg.has_field(tag::PRICE));
        assert!(!msg.has_field(tag::STOP_PX));
        assert_eq!(msg.get_field(tag::CL_ORD_ID), Some("42"));
    }

    #[test]
    fn test_encode_unmapped_symbol() {
        let encoder = OrderEncoder::new(SymbolMapper::new(), MessageFactory::new("FIX.4.2"));
        let order = DomainOrder::new(
            "7",
            Symbol::new("SPX", SecurityType::Index),
            OrderDirection::Buy,
            dec!(1),
            OrderKind::Market,
        );
        assert!(matches!(
            encoder.encode(&order),
            Err(OrderError::UnmappedSymbol { .. })
        ));
    }
}
