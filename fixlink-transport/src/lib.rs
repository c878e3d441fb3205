/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # FixLink Transport
//!
//! TCP transport for the FixLink brokerage adapter.
//!
//! This crate provides:
//! - **Codec**: Tokio codec that frames FIX messages on a byte stream
//! - **Initiator**: [`TcpInitiator`], an initiator-side implementation of
//!   the session [`Transport`](fixlink_session::Transport) contract
//! - **Factory**: [`TcpInitiatorFactory`], which builds a fresh initiator per
//!   connect attempt

pub mod codec;
pub mod initiator;

pub use codec::{CodecError, FixCodec};
pub use initiator::{TcpInitiator, TcpInitiatorFactory};
