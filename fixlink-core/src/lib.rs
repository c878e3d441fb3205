/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # FixLink Core
//!
//! Core types, field tags, and error definitions for the FixLink brokerage adapter.
//!
//! This crate provides the building blocks shared by every FixLink crate:
//! - **Error types**: Unified error handling with `thiserror`
//! - **Field tags**: Tag constants and the borrowed [`FieldRef`] view used by the decoder
//! - **Messages**: [`MsgType`], the owned and mutable [`FixMessage`], and [`MessageFactory`]
//! - **Core types**: [`SessionIdentity`], [`CompId`], [`Timestamp`], [`Side`], [`OrdType`]

pub mod error;
pub mod field;
pub mod identity;
pub mod message;
pub mod types;

pub use error::{DecodeError, EncodeError, FixError, OrderError, Result, SessionError};
pub use field::{FieldRef, tag};
pub use identity::SessionIdentity;
pub use message::{FixMessage, MessageFactory, MsgType};
pub use types::{CompId, HandlInst, OrdType, Side, Timestamp};
