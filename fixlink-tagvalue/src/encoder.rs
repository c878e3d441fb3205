/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! FIX message encoder.
//!
//! Builds tag=value frames, prepending BeginString and BodyLength and
//! appending the CheckSum trailer.

use crate::checksum::{calculate_checksum, format_checksum};
use bytes::{BufMut, BytesMut};
use fixlink_core::error::EncodeError;
use fixlink_core::field::tag;
use fixlink_core::message::FixMessage;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Header fields every outbound frame must carry.
const REQUIRED_HEADER: [u32; 4] = [
    tag::SENDER_COMP_ID,
    tag::TARGET_COMP_ID,
    tag::MSG_SEQ_NUM,
    tag::SENDING_TIME,
];

/// Low-level tag=value frame builder.
#[derive(Debug)]
pub struct Encoder {
    /// Buffer for the message body (between BodyLength and CheckSum).
    body: BytesMut,
    /// The BeginString value (e.g., "FIX.4.4").
    begin_string: String,
}

impl Encoder {
    /// Creates a new encoder with the specified BeginString.
    #[must_use]
    pub fn new(begin_string: impl Into<String>) -> Self {
        Self {
            body: BytesMut::with_capacity(256),
            begin_string: begin_string.into(),
        }
    }

    /// Appends a field with a string value.
    #[inline]
    pub fn put_str(&mut self, tag: u32, value: &str) {
        self.put_raw(tag, value.as_bytes());
    }

    /// Appends a field with raw bytes.
    #[inline]
    pub fn put_raw(&mut self, tag: u32, value: &[u8]) {
        let mut tag_buf = itoa::Buffer::new();
        self.body.put_slice(tag_buf.format(tag).as_bytes());
        self.body.put_u8(b'=');
        self.body.put_slice(value);
        self.body.put_u8(SOH);
    }

    /// Returns the current body length.
    #[inline]
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Finalizes the frame and returns the complete encoded bytes.
    #[must_use]
    pub fn finish(self) -> BytesMut {
        let body_len = self.body.len();
        let mut len_buf = itoa::Buffer::new();
        let len_str = len_buf.format(body_len);

        let mut message =
            BytesMut::with_capacity(self.begin_string.len() + len_str.len() + body_len + 16);
        message.put_slice(b"8=");
        message.put_slice(self.begin_string.as_bytes());
        message.put_u8(SOH);
        message.put_slice(b"9=");
        message.put_slice(len_str.as_bytes());
        message.put_u8(SOH);
        message.put_slice(&self.body);

        let checksum = format_checksum(calculate_checksum(&message));
        message.put_slice(b"10=");
        message.put_slice(&checksum);
        message.put_u8(SOH);
        message
    }
}

/// Encodes a complete message into a wire frame.
///
/// Header fields are written in standard order right after MsgType,
/// followed by body fields in insertion order.
///
/// # Errors
/// Returns `EncodeError::MissingRequiredField` if a standard header field
/// is absent, or `EncodeError::EmbeddedDelimiter` if a value contains SOH.
pub fn encode_message(message: &FixMessage) -> Result<BytesMut, EncodeError> {
    if let Some(&missing) = REQUIRED_HEADER
        .iter()
        .find(|&&t| !message.has_field(t))
    {
        return Err(EncodeError::MissingRequiredField { tag: missing });
    }
    if let Some((bad, _)) = message.fields().find(|(_, v)| v.as_bytes().contains(&SOH)) {
        return Err(EncodeError::EmbeddedDelimiter { tag: bad });
    }

    let mut encoder = Encoder::new(message.begin_string());
    encoder.put_str(tag::MSG_TYPE, message.msg_type().as_str());
    for header_tag in tag::HEADER_ORDER.iter().skip(1) {
        if let Some(value) = message.get_field(*header_tag) {
            encoder.put_str(*header_tag, value);
        }
    }
    if let Some(value) = message.get_field(tag::POSS_DUP_FLAG) {
        encoder.put_str(tag::POSS_DUP_FLAG, value);
    }
    for (field_tag, value) in message.fields() {
        if !tag::is_header_or_trailer(field_tag) {
            encoder.put_str(field_tag, value);
        }
    }
    Ok(encoder.finish())
}
