/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Tokio codec that splits a TCP byte stream into whole FIX frames.
//!
//! Framing only looks at BeginString, BodyLength and the trailing CheckSum;
//! field parsing is left to [`fixlink_tagvalue::Decoder`].

use bytes::{BufMut, BytesMut};
use fixlink_core::error::DecodeError;
use fixlink_tagvalue::checksum::{calculate_checksum, parse_checksum};
use memchr::memchr;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Default upper bound on one frame.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Length of the `10=NNN<SOH>` trailer.
const TRAILER_LEN: usize = 7;

const SOH: u8 = 0x01;

/// Errors raised while framing.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame header or trailer is malformed.
    #[error("framing error: {0}")]
    Decode(#[from] DecodeError),

    /// The declared frame is larger than allowed.
    #[error("frame too large: {size} bytes exceeds maximum {max_size}")]
    FrameTooLarge {
        /// Declared frame size.
        size: usize,
        /// Configured maximum.
        max_size: usize,
    },

    /// Underlying socket error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// FIX frame codec.
#[derive(Debug, Clone)]
pub struct FixCodec {
    max_frame_size: usize,
    validate_checksum: bool,
}

impl FixCodec {
    /// Creates a codec with checksum validation enabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            validate_checksum: true,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub const fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Enables or disables checksum validation.
    #[must_use]
    pub const fn with_checksum_validation(mut self, validate: bool) -> Self {
        self.validate_checksum = validate;
        self
    }

    /// Returns the full length of the frame at the start of `src`, or `None`
    /// if the header is not complete yet.
    fn frame_length(src: &[u8]) -> Result<Option<usize>, DecodeError> {
        if src.len() < 2 {
            return Ok(None);
        }
        if &src[..2] != b"8=" {
            return Err(DecodeError::InvalidBeginString);
        }

        let Some(first_soh) = memchr(SOH, src) else {
            return Ok(None);
        };
        let len_start = first_soh + 1;
        if src.len() < len_start + 2 {
            return Ok(None);
        }
        if &src[len_start..len_start + 2] != b"9=" {
            return Err(DecodeError::MissingBodyLength);
        }
        let Some(rel) = memchr(SOH, &src[len_start..]) else {
            return Ok(None);
        };
        let len_soh = len_start + rel;

        let body_len = std::str::from_utf8(&src[len_start + 2..len_soh])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or(DecodeError::InvalidBodyLength)?;

        Ok(Some(len_soh + 1 + body_len + TRAILER_LEN))
    }
}

impl Default for FixCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FixCodec {
    type Item = BytesMut;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(total) = Self::frame_length(src)? else {
            return Ok(None);
        };

        if total > self.max_frame_size {
            return Err(CodecError::FrameTooLarge {
                size: total,
                max_size: self.max_frame_size,
            });
        }
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let trailer = &src[total - TRAILER_LEN..total];
        if &trailer[..3] != b"10=" || trailer[6] != SOH {
            return Err(DecodeError::InvalidBodyLength.into());
        }

        if self.validate_checksum {
            let declared = parse_checksum(&trailer[3..6]).ok_or(DecodeError::InvalidFieldValue {
                tag: 10,
                reason: "checksum must be three digits".to_string(),
            })?;
            let calculated = calculate_checksum(&src[..total - TRAILER_LEN]);
            if calculated != declared {
                return Err(DecodeError::ChecksumMismatch {
                    calculated,
                    declared,
                }
                .into());
            }
        }

        Ok(Some(src.split_to(total)))
    }
}

impl Encoder<BytesMut> for FixCodec {
    type Error = CodecError;

    fn encode(&mut self, item: BytesMut, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        dst.put_slice(&item);
        Ok(())
    }
}
