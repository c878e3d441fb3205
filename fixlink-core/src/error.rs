/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Error types for the FixLink brokerage adapter.
//!
//! This module provides a unified error hierarchy using `thiserror` for typed,
//! domain-specific errors across wire handling, session lifecycle, and order
//! encoding.

use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for all FixLink operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Error during message decoding.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Error in session lifecycle operations.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Error while turning a domain order into a protocol message.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// I/O error from underlying transport.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur during FIX message decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Message buffer is incomplete, need more data.
    #[error("incomplete message, need more data")]
    Incomplete,

    /// Invalid BeginString field (tag 8).
    #[error("invalid begin string: expected 8=FIX.x.y")]
    InvalidBeginString,

    /// Missing BodyLength field (tag 9).
    #[error("missing body length field (tag 9)")]
    MissingBodyLength,

    /// Invalid BodyLength value.
    #[error("invalid body length value")]
    InvalidBodyLength,

    /// Missing MsgType field (tag 35).
    #[error("missing msg type field (tag 35)")]
    MissingMsgType,

    /// Checksum mismatch between calculated and declared values.
    #[error("checksum mismatch: calculated {calculated}, declared {declared}")]
    ChecksumMismatch {
        /// Calculated checksum value.
        calculated: u8,
        /// Declared checksum value in message.
        declared: u8,
    },

    /// Missing required field.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Invalid field value for the expected type.
    #[error("invalid field value for tag {tag}: {reason}")]
    InvalidFieldValue {
        /// The tag number of the field.
        tag: u32,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// Invalid UTF-8 in string field.
    #[error("invalid utf-8 in field: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Errors that occur during FIX message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Missing required field during encoding.
    #[error("missing required field: tag {tag}")]
    MissingRequiredField {
        /// The tag number of the missing field.
        tag: u32,
    },

    /// Field value contains the SOH delimiter and cannot be framed.
    #[error("field value for tag {tag} contains a SOH delimiter")]
    EmbeddedDelimiter {
        /// The tag number of the field.
        tag: u32,
    },
}

/// Errors in session lifecycle operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No ready session is available for sending.
    #[error("session is not connected")]
    NotConnected,

    /// The owner has terminated the session supervisor.
    #[error("session supervisor has been terminated")]
    Terminated,

    /// No Logon acknowledgement arrived within the logon timeout.
    #[error("logon not acknowledged within {timeout_ms} milliseconds")]
    LogonTimeout {
        /// The logon timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Logon was rejected by counterparty.
    #[error("logon rejected: {reason}")]
    LogonRejected {
        /// Reason for rejection.
        reason: String,
    },

    /// Session configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),
}

/// Errors raised while encoding a domain order.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The instrument has no broker-side ticker or security type mapping.
    #[error("no broker mapping for symbol {symbol}: {reason}")]
    UnmappedSymbol {
        /// The domain ticker that could not be mapped.
        symbol: String,
        /// Why the mapping failed.
        reason: String,
    },

    /// The message carries no OrdType, so the order kind is not supported.
    #[error("order {cl_ord_id} has no order type and will not be sent")]
    MissingOrderType {
        /// ClOrdID of the refused message.
        cl_ord_id: String,
    },
}
