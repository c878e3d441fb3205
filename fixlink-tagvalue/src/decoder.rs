/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! FIX message decoder.
//!
//! Walks a complete tag=value frame, validating BeginString, BodyLength,
//! MsgType and CheckSum, and collects the remaining fields into an owned
//! [`FixMessage`].

use crate::checksum::{calculate_checksum, parse_checksum};
use fixlink_core::error::DecodeError;
use fixlink_core::field::{FieldRef, tag};
use fixlink_core::message::{FixMessage, MsgType};
use memchr::memchr;

/// SOH (Start of Header) delimiter used in FIX messages.
pub const SOH: u8 = 0x01;

/// Equals sign delimiter between tag and value.
pub const EQUALS: u8 = b'=';

/// Field cursor over one FIX frame.
#[derive(Debug)]
pub struct Decoder<'a> {
    /// Input buffer.
    input: &'a [u8],
    /// Current position in the buffer.
    offset: usize,
    /// Whether to validate checksums.
    validate_checksum: bool,
}

impl<'a> Decoder<'a> {
    /// Creates a new decoder for the given input buffer.
    #[inline]
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            validate_checksum: true,
        }
    }

    /// Sets whether to validate checksums during decoding.
    #[inline]
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Decodes one complete message from the buffer.
    ///
    /// # Errors
    /// Returns `DecodeError` if the frame is malformed or incomplete.
    pub fn decode(&mut self) -> Result<FixMessage, DecodeError> {
        let start_offset = self.offset;

        let begin_string = self.next_field().ok_or(DecodeError::Incomplete)?;
        if begin_string.tag != tag::BEGIN_STRING {
            return Err(DecodeError::InvalidBeginString);
        }

        let body_length = self.next_field().ok_or(DecodeError::MissingBodyLength)?;
        if body_length.tag != tag::BODY_LENGTH {
            return Err(DecodeError::MissingBodyLength);
        }
        let body_length: usize = body_length
            .as_str()?
            .parse()
            .map_err(|_| DecodeError::InvalidBodyLength)?;
        let body_start = self.offset;

        let msg_type = self.next_field().ok_or(DecodeError::MissingMsgType)?;
        if msg_type.tag != tag::MSG_TYPE {
            return Err(DecodeError::MissingMsgType);
        }
        let Ok(msg_type) = msg_type.as_str()?.parse::<MsgType>();

        let mut message = FixMessage::new(begin_string.as_str()?, msg_type);
        let mut checksum_field = None;
        while let Some(field) = self.next_field() {
            if field.tag == tag::CHECKSUM {
                checksum_field = Some(field);
                break;
            }
            message.set_field(field.tag, field.as_str()?);
        }

        let checksum_field = checksum_field.ok_or(DecodeError::Incomplete)?;
        let checksum_start = self.offset - checksum_field.value.len() - 4;
        if checksum_start - body_start != body_length {
            return Err(DecodeError::InvalidBodyLength);
        }

        if self.validate_checksum {
            let declared =
                parse_checksum(checksum_field.value).ok_or_else(|| DecodeError::InvalidFieldValue {
                    tag: tag::CHECKSUM,
                    reason: "invalid checksum format".to_string(),
                })?;
            let calculated = calculate_checksum(&self.input[start_offset..checksum_start]);
            if calculated != declared {
                return Err(DecodeError::ChecksumMismatch {
                    calculated,
                    declared,
                });
            }
        }

        Ok(message)
    }

    /// Parses the next field from the buffer.
    ///
    /// # Returns
    /// The next field, or `None` if the buffer is exhausted or malformed.
    #[inline]
    pub fn next_field(&mut self) -> Option<FieldRef<'a>> {
        let remaining = self.input.get(self.offset..)?;
        if remaining.is_empty() {
            return None;
        }

        let eq_pos = memchr(EQUALS, remaining)?;
        let tag = parse_tag(&remaining[..eq_pos])?;

        let value_start = eq_pos + 1;
        let soh_pos = memchr(SOH, &remaining[value_start..])?;
        let value = &remaining[value_start..value_start + soh_pos];

        self.offset += value_start + soh_pos + 1;
        Some(FieldRef::new(tag, value))
    }
}

/// Decodes a complete frame with checksum validation.
///
/// # Errors
/// Returns `DecodeError` if the frame is malformed.
pub fn decode_message(frame: &[u8]) -> Result<FixMessage, DecodeError> {
    Decoder::new(frame).decode()
}

/// Parses a tag number from ASCII digits.
#[inline]
fn parse_tag(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 10 {
        return None;
    }

    bytes.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_message;

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag(b"8"), Some(8));
        assert_eq!(parse_tag(b"12345"), Some(12345));
        assert_eq!(parse_tag(b""), None);
        assert_eq!(parse_tag(b"12a"), None);
    }

    #[test]
    fn test_decode_execution_report() {
        let mut report = FixMessage::new("FIX.4.4", MsgType::ExecutionReport);
        report.set_field(tag::SENDER_COMP_ID, "BROKER");
        report.set_field(tag::TARGET_COMP_ID, "CLIENT");
        report.set_field(tag::MSG_SEQ_NUM, 12);
        report.set_field(tag::SENDING_TIME, "20260101-00:00:00.000");
        report.set_field(tag::CL_ORD_ID, "42");
        report.set_field(tag::EXEC_TYPE, "F");
        let frame = encode_message(&report).unwrap();

        let decoded = decode_message(&frame).unwrap();
        assert_eq!(decoded.msg_type(), &MsgType::ExecutionReport);
        assert_eq!(decoded.begin_string(), "FIX.4.4");
        assert_eq!(decoded.get_field(tag::CL_ORD_ID), Some("42"));
        assert_eq!(decoded.get_field_as::<u64>(tag::MSG_SEQ_NUM).unwrap(), 12);
        assert!(!decoded.has_field(tag::CHECKSUM));
    }

    #[test]
    fn test_decode_checksum_mismatch() {
        let result = decode_message(b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01");
        assert_eq!(
            result,
            Err(DecodeError::ChecksumMismatch {
                calculated: 163,
                declared: 0
            })
        );
    }

    #[test]
    fn test_decode_without_checksum_validation() {
        let msg = Decoder::new(b"8=FIX.4.4\x019=5\x0135=0\x0110=000\x01")
            .with_checksum_validation(false)
            .decode()
            .unwrap();
        assert_eq!(msg.msg_type(), &MsgType::Heartbeat);
    }

    #[test]
    fn test_decode_wrong_body_length() {
        let result = Decoder::new(b"8=FIX.4.4\x019=9\x0135=0\x0110=000\x01")
            .with_checksum_validation(false)
            .decode();
        assert_eq!(result, Err(DecodeError::InvalidBodyLength));
    }

    #[test]
    fn test_decode_missing_msg_type() {
        let result = decode_message(b"8=FIX.4.4\x019=5\x0149=X\x0110=000\x01");
        assert_eq!(result, Err(DecodeError::MissingMsgType));
    }

    #[test]
    fn test_decoder_incomplete() {
        assert_eq!(decode_message(b"8=FIX.4.4"), Err(DecodeError::Incomplete));
    }
}
