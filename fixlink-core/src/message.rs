/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Message types for FIX protocol.
//!
//! This module provides:
//! - [`MsgType`]: The message types the adapter sends or routes
//! - [`FixMessage`]: Owned, mutable message used on both directions
//! - [`MessageFactory`]: Creates messages stamped with the session's BeginString

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// FIX message types handled by the adapter.
///
/// Anything the adapter does not route explicitly is carried as `Custom(String)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MsgType {
    /// Heartbeat (0) - Session level.
    #[default]
    Heartbeat,
    /// Test Request (1) - Session level.
    TestRequest,
    /// Resend Request (2) - Session level.
    ResendRequest,
    /// Reject (3) - Session level.
    Reject,
    /// Sequence Reset (4) - Session level.
    SequenceReset,
    /// Logout (5) - Session level.
    Logout,
    /// Execution Report (8).
    ExecutionReport,
    /// Order Cancel Reject (9).
    OrderCancelReject,
    /// Logon (A) - Session level.
    Logon,
    /// New Order Single (D).
    NewOrderSingle,
    /// Order Cancel Request (F).
    OrderCancelRequest,
    /// Order Cancel/Replace Request (G).
    OrderCancelReplaceRequest,
    /// Order Status Request (H).
    OrderStatusRequest,
    /// Business Message Reject (j).
    BusinessMessageReject,
    /// Custom or unknown message type.
    Custom(String),
}

impl std::str::FromStr for MsgType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "2" => Self::ResendRequest,
            "3" => Self::Reject,
            "4" => Self::SequenceReset,
            "5" => Self::Logout,
            "8" => Self::ExecutionReport,
            "9" => Self::OrderCancelReject,
            "A" => Self::Logon,
            "D" => Self::NewOrderSingle,
            "F" => Self::OrderCancelRequest,
            "G" => Self::OrderCancelReplaceRequest,
            "H" => Self::OrderStatusRequest,
            "j" => Self::BusinessMessageReject,
            other => Self::Custom(other.to_string()),
        })
    }
}

impl MsgType {
    /// Returns the wire representation of this message type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::ResendRequest => "2",
            Self::Reject => "3",
            Self::SequenceReset => "4",
            Self::Logout => "5",
            Self::ExecutionReport => "8",
            Self::OrderCancelReject => "9",
            Self::Logon => "A",
            Self::NewOrderSingle => "D",
            Self::OrderCancelRequest => "F",
            Self::OrderCancelReplaceRequest => "G",
            Self::OrderStatusRequest => "H",
            Self::BusinessMessageReject => "j",
            Self::Custom(s) => s.as_str(),
        }
    }

    /// Returns true if this is an administrative message.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Heartbeat
                | Self::TestRequest
                | Self::ResendRequest
                | Self::Reject
                | Self::SequenceReset
                | Self::Logout
                | Self::Logon
        )
    }

    /// Returns true if this is an application message.
    #[must_use]
    pub fn is_app(&self) -> bool {
        !self.is_admin()
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Owned FIX message.
///
/// Fields are kept in insertion order, with at most one value per tag.
/// BeginString, BodyLength and CheckSum are not stored as fields; the
/// wire encoder derives them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixMessage {
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: String,
    /// The message type.
    msg_type: MsgType,
    /// Tag/value pairs excluding BeginString, BodyLength, MsgType and CheckSum.
    fields: SmallVec<[(u32, String); 16]>,
}

impl FixMessage {
    /// Creates an empty message of the given type.
    ///
    /// # Arguments
    /// * `begin_string` - The FIX version string
    /// * `msg_type` - The message type
    #[must_use]
    pub fn new(begin_string: impl Into<String>, msg_type: MsgType) -> Self {
        Self {
            begin_string: begin_string.into(),
            msg_type,
            fields: SmallVec::new(),
        }
    }

    /// Returns the BeginString value.
    #[inline]
    #[must_use]
    pub fn begin_string(&self) -> &str {
        &self.begin_string
    }

    /// Returns the message type.
    #[inline]
    #[must_use]
    pub fn msg_type(&self) -> &MsgType {
        &self.msg_type
    }

    /// Sets a field, replacing any previous value for the same tag.
    ///
    /// # Arguments
    /// * `tag` - The field tag number
    /// * `value` - Any displayable value (strings, integers, decimals, chars)
    pub fn set_field(&mut self, tag: u32, value: impl fmt::Display) {
        let value = value.to_string();
        match self.fields.iter_mut().find(|(t, _)| *t == tag) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((tag, value)),
        }
    }

    /// Removes a field, returning its previous value.
    pub fn remove_field(&mut self, tag: u32) -> Option<String> {
        let pos = self.fields.iter().position(|(t, _)| *t == tag)?;
        Some(self.fields.remove(pos).1)
    }

    /// Gets a field value as a string.
    #[must_use]
    pub fn get_field(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// Gets a field value parsed as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError` if the field is missing or cannot be parsed.
    pub fn get_field_as<T: std::str::FromStr>(&self, tag: u32) -> Result<T, DecodeError> {
        let value = self
            .get_field(tag)
            .ok_or(DecodeError::MissingRequiredField { tag })?;
        value.parse().map_err(|_| DecodeError::InvalidFieldValue {
            tag,
            reason: format!(
                "failed to parse '{}' as {}",
                value,
                std::any::type_name::<T>()
            ),
        })
    }

    /// Returns true if the message carries the given tag.
    #[inline]
    #[must_use]
    pub fn has_field(&self, tag: u32) -> bool {
        self.fields.iter().any(|(t, _)| *t == tag)
    }

    /// Returns an iterator over all fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (u32, &str)> {
        self.fields.iter().map(|(t, v)| (*t, v.as_str()))
    }

    /// Returns the number of fields.
    #[inline]
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

impl fmt::Display for FixMessage {
    /// Renders the message with `|` separators, for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "8={}|35={}|", self.begin_string, self.msg_type)?;
        for (tag, value) in &self.fields {
            write!(f, "{}={}|", tag, value)?;
        }
        Ok(())
    }
}

/// Creates messages for one FIX version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFactory {
    begin_string: String,
}

impl MessageFactory {
    /// Creates a factory for the given BeginString.
    #[must_use]
    pub fn new(begin_string: impl Into<String>) -> Self {
        Self {
            begin_string: begin_string.into(),
        }
    }

    /// Returns the BeginString stamped on created messages.
    #[must_use]
    pub fn begin_string(&self) -> &str {
        &self.begin_string
    }

    /// Creates an empty message of the given type.
    #[must_use]
    pub fn create(&self, msg_type: MsgType) -> FixMessage {
        FixMessage::new(self.begin_string.clone(), msg_type)
    }
}

impl Default for MessageFactory {
    fn default() -> Self {
        Self::new("FIX.4.4")
    }
}
