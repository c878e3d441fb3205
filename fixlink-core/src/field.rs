/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Field tags and borrowed field views.
//!
//! This module provides:
//! - [`tag`]: Constants for every FIX tag the adapter reads or writes
//! - [`FieldRef`]: Zero-copy reference to a field within a wire buffer

use crate::error::DecodeError;
use std::str::FromStr;

/// FIX tag numbers used by the adapter.
pub mod tag {
    /// AvgPx (6).
    pub const AVG_PX: u32 = 6;
    /// BeginString (8).
    pub const BEGIN_STRING: u32 = 8;
    /// BodyLength (9).
    pub const BODY_LENGTH: u32 = 9;
    /// CheckSum (10).
    pub const CHECKSUM: u32 = 10;
    /// ClOrdID (11).
    pub const CL_ORD_ID: u32 = 11;
    /// CumQty (14).
    pub const CUM_QTY: u32 = 14;
    /// ExecID (17).
    pub const EXEC_ID: u32 = 17;
    /// HandlInst (21).
    pub const HANDL_INST: u32 = 21;
    /// LastPx (31).
    pub const LAST_PX: u32 = 31;
    /// LastQty (32).
    pub const LAST_QTY: u32 = 32;
    /// MsgSeqNum (34).
    pub const MSG_SEQ_NUM: u32 = 34;
    /// MsgType (35).
    pub const MSG_TYPE: u32 = 35;
    /// NewSeqNo (36).
    pub const NEW_SEQ_NO: u32 = 36;
    /// OrderID (37).
    pub const ORDER_ID: u32 = 37;
    /// OrderQty (38).
    pub const ORDER_QTY: u32 = 38;
    /// OrdStatus (39).
    pub const ORD_STATUS: u32 = 39;
    /// OrdType (40).
    pub const ORD_TYPE: u32 = 40;
    /// OrigClOrdID (41).
    pub const ORIG_CL_ORD_ID: u32 = 41;
    /// PossDupFlag (43).
    pub const POSS_DUP_FLAG: u32 = 43;
    /// Price (44).
    pub const PRICE: u32 = 44;
    /// RefSeqNum (45).
    pub const REF_SEQ_NUM: u32 = 45;
    /// SenderCompID (49).
    pub const SENDER_COMP_ID: u32 = 49;
    /// SendingTime (52).
    pub const SENDING_TIME: u32 = 52;
    /// Side (54).
    pub const SIDE: u32 = 54;
    /// Symbol (55).
    pub const SYMBOL: u32 = 55;
    /// TargetCompID (56).
    pub const TARGET_COMP_ID: u32 = 56;
    /// Text (58).
    pub const TEXT: u32 = 58;
    /// TransactTime (60).
    pub const TRANSACT_TIME: u32 = 60;
    /// EncryptMethod (98).
    pub const ENCRYPT_METHOD: u32 = 98;
    /// StopPx (99).
    pub const STOP_PX: u32 = 99;
    /// CxlRejReason (102).
    pub const CXL_REJ_REASON: u32 = 102;
    /// HeartBtInt (108).
    pub const HEART_BT_INT: u32 = 108;
    /// TestReqID (112).
    pub const TEST_REQ_ID: u32 = 112;
    /// OnBehalfOfCompID (115).
    pub const ON_BEHALF_OF_COMP_ID: u32 = 115;
    /// ResetSeqNumFlag (141).
    pub const RESET_SEQ_NUM_FLAG: u32 = 141;
    /// ExecType (150).
    pub const EXEC_TYPE: u32 = 150;
    /// LeavesQty (151).
    pub const LEAVES_QTY: u32 = 151;
    /// SecurityType (167).
    pub const SECURITY_TYPE: u32 = 167;
    /// RefMsgType (372).
    pub const REF_MSG_TYPE: u32 = 372;
    /// BusinessRejectReason (380).
    pub const BUSINESS_REJECT_REASON: u32 = 380;
    /// Username (553).
    pub const USERNAME: u32 = 553;
    /// Password (554).
    pub const PASSWORD: u32 = 554;

    /// Standard header fields, in the order they are written after BodyLength.
    pub const HEADER_ORDER: [u32; 6] = [
        MSG_TYPE,
        SENDER_COMP_ID,
        TARGET_COMP_ID,
        ON_BEHALF_OF_COMP_ID,
        MSG_SEQ_NUM,
        SENDING_TIME,
    ];

    /// Returns true if the tag belongs to the standard header or trailer.
    #[must_use]
    pub const fn is_header_or_trailer(tag: u32) -> bool {
        matches!(
            tag,
            BEGIN_STRING
                | BODY_LENGTH
                | CHECKSUM
                | MSG_TYPE
                | SENDER_COMP_ID
                | TARGET_COMP_ID
                | ON_BEHALF_OF_COMP_ID
                | MSG_SEQ_NUM
                | POSS_DUP_FLAG
                | SENDING_TIME
        )
    }
}

/// Zero-copy reference to a field within a FIX message buffer.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    /// The field tag number.
    pub tag: u32,
    /// Reference to the field value bytes (without delimiters).
    pub value: &'a [u8],
}

impl<'a> FieldRef<'a> {
    /// Creates a new field reference.
    #[inline]
    #[must_use]
    pub const fn new(tag: u32, value: &'a [u8]) -> Self {
        Self { tag, value }
    }

    /// Returns the value as a string slice.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidUtf8` if the value is not valid UTF-8.
    pub fn as_str(&self) -> Result<&'a str, DecodeError> {
        std::str::from_utf8(self.value).map_err(DecodeError::from)
    }

    /// Parses the value as the specified type.
    ///
    /// # Errors
    /// Returns `DecodeError::InvalidFieldValue` if parsing fails.
    pub fn parse<T: FromStr>(&self) -> Result<T, DecodeError> {
        let s = self.as_str()?;
        s.parse().map_err(|_| DecodeError::InvalidFieldValue {
            tag: self.tag,
            reason: format!("failed to parse '{}' as {}", s, std::any::type_name::<T>()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ref_as_str() {
        let field = FieldRef::new(11, b"ORDER123");
        assert_eq!(field.as_str().unwrap(), "ORDER123");
    }

    #[test]
    fn test_field_ref_parse() {
        let field = FieldRef::new(34, b"12345");
        assert_eq!(field.parse::<u64>().unwrap(), 12345);

        let bad = FieldRef::new(34, b"12a");
        assert!(matches!(
            bad.parse::<u64>(),
            Err(DecodeError::InvalidFieldValue { tag: 34, .. })
        ));
    }

    #[test]
    fn test_field_ref_invalid_utf8() {
        let field = FieldRef::new(1, &[0xFF, 0xFE]);
        assert!(field.as_str().is_err());
    }

    #[test]
    fn test_header_tags() {
        assert!(tag::is_header_or_trailer(tag::ON_BEHALF_OF_COMP_ID));
        assert!(tag::is_header_or_trailer(tag::SENDING_TIME));
        assert!(!tag::is_header_or_trailer(tag::CL_ORD_ID));
        assert!(!tag::is_header_or_trailer(tag::ORD_TYPE));
    }
}
