/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Sequence number bookkeeping for one transport instance.

use crate::config::SessionSettings;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks outgoing and expected incoming sequence numbers.
///
/// Uses atomics so the reader and writer halves of a transport can share it
/// without locks.
#[derive(Debug)]
pub struct SequenceManager {
    next_sender_seq: AtomicU64,
    next_target_seq: AtomicU64,
}

impl SequenceManager {
    /// Creates a manager seeded from the session settings.
    #[must_use]
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            next_sender_seq: AtomicU64::new(settings.next_sender_seq.max(1)),
            next_target_seq: AtomicU64::new(settings.next_target_seq.max(1)),
        }
    }

    /// Allocates the next outgoing sequence number.
    #[inline]
    pub fn allocate_sender_seq(&self) -> u64 {
        self.next_sender_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the next expected incoming sequence number.
    #[inline]
    #[must_use]
    pub fn next_target_seq(&self) -> u64 {
        self.next_target_seq.load(Ordering::SeqCst)
    }

    /// Validates an incoming sequence number and advances on success or gap.
    ///
    /// A gap is accepted and the expectation moves past it, since this
    /// adapter does not issue ResendRequests.
    pub fn on_incoming(&self, received: u64) -> SequenceResult {
        let expected = self.next_target_seq.load(Ordering::SeqCst);
        if received < expected {
            return SequenceResult::TooLow { expected, received };
        }
        self.next_target_seq.store(received + 1, Ordering::SeqCst);
        if received == expected {
            SequenceResult::Ok
        } else {
            SequenceResult::Gap { expected, received }
        }
    }

    /// Moves the expected incoming sequence number (SequenceReset handling).
    #[inline]
    pub fn set_target_seq(&self, seq: u64) {
        self.next_target_seq.store(seq, Ordering::SeqCst);
    }
}

impl Default for SequenceManager {
    fn default() -> Self {
        Self::from_settings(&SessionSettings::default())
    }
}

/// Result of sequence number validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceResult {
    /// Sequence number is as expected.
    Ok,
    /// Sequence number is lower than expected.
    TooLow {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
    /// Sequence number is higher than expected.
    Gap {
        /// Expected sequence number.
        expected: u64,
        /// Received sequence number.
        received: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sender_seq() {
        let mgr = SequenceManager::default();
        assert_eq!(mgr.allocate_sender_seq(), 1);
        assert_eq!(mgr.allocate_sender_seq(), 2);
    }

    #[test]
    fn test_from_settings() {
        let settings = SessionSettings {
            reset_seq_num_flag: false,
            next_sender_seq: 40,
            next_target_seq: 0,
        };
        let mgr = SequenceManager::from_settings(&settings);
        assert_eq!(mgr.allocate_sender_seq(), 40);
        assert_eq!(mgr.next_target_seq(), 1);
    }

    #[test]
    fn test_on_incoming() {
        let mgr = SequenceManager::default();
        assert_eq!(mgr.on_incoming(1), SequenceResult::Ok);
        assert_eq!(
            mgr.on_incoming(5),
            SequenceResult::Gap {
                expected: 2,
                received: 5
            }
        );
        assert_eq!(mgr.next_target_seq(), 6);
        assert_eq!(
            mgr.on_incoming(3),
            SequenceResult::TooLow {
                expected: 6,
                received: 3
            }
        );
        assert_eq!(mgr.next_target_seq(), 6);
    }
}
