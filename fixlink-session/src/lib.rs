/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # FixLink Session
//!
//! Session-level contracts shared by the transport and the engine.
//!
//! This crate provides:
//! - **Configuration**: [`FixConfiguration`] with resettable sequence settings
//! - **Callbacks**: the [`Application`] trait the transport drives
//! - **Transport contract**: [`Transport`] and [`TransportFactory`]
//! - **Sequence and heartbeat bookkeeping** for initiator implementations
//! - **Logging**: [`SessionLogger`] and the per-identity [`LoggerRegistry`]

pub mod application;
pub mod config;
pub mod heartbeat;
pub mod log;
pub mod sequence;
pub mod transport;

pub use application::{Application, NoOpApplication, RejectReason};
pub use config::{FixConfiguration, SessionSettings};
pub use heartbeat::HeartbeatManager;
pub use log::{LoggerRegistry, SessionLogger};
pub use sequence::{SequenceManager, SequenceResult};
pub use transport::{Transport, TransportFactory};
