/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! # FixLink Tag-Value
//!
//! FIX tag=value wire format for the FixLink adapter.
//!
//! Outbound [`FixMessage`]s are framed with BeginString, BodyLength and
//! CheckSum by the [`Encoder`]; inbound frames are parsed back into
//! [`FixMessage`]s by the [`Decoder`].

pub mod checksum;
pub mod decoder;
pub mod encoder;

pub use checksum::calculate_checksum;
pub use decoder::{Decoder, decode_message};
pub use encoder::{Encoder, encode_message};
pub use fixlink_core::message::FixMessage;
