/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # FixLink Engine
//!
//! Brokerage-facing side of the FixLink adapter.
//!
//! This crate provides:
//! - **Supervisor**: Keeps one FIX session alive, gated on market hours,
//!   with bounded retries and a single fatal escalation
//! - **Order encoding**: Maps domain orders and symbols to NewOrderSingle
//! - **Router**: Dispatches session callbacks to a brokerage handler
//! - **Builder API**: Fluent configuration for supervisor setup

pub mod builder;
pub mod calendar;
pub mod encoder;
pub mod mapper;
pub mod order;
pub mod router;
pub mod signal;
pub mod supervisor;

#[cfg(test)]
mod testing;

pub use builder::SupervisorBuilder;
pub use calendar::{AlwaysOpen, MarketCalendar, SessionWindow, WeeklySchedule};
pub use encoder::OrderEncoder;
pub use mapper::{MappedSymbol, SymbolMapper};
pub use order::{DomainOrder, OrderDirection, OrderKind, SecurityType, Symbol};
pub use router::{AppMessage, BrokerageHandler, HandlerError, SessionRouter};
pub use signal::{LoginSignal, LoginWait};
pub use supervisor::{FatalConnectivityError, Supervisor, SupervisorSettings, SupervisorState};
