/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Heartbeat and TestRequest timing.
//!
//! Decides when the initiator should send a Heartbeat, when it should probe
//! the counterparty with a TestRequest, and when the link is considered dead.

use std::time::{Duration, Instant};

/// Grace period added to the interval before probing with a TestRequest.
const TEST_REQUEST_GRACE: Duration = Duration::from_secs(1);

/// Heartbeat timing for one transport instance.
#[derive(Debug)]
pub struct HeartbeatManager {
    interval: Duration,
    last_sent: Instant,
    last_received: Instant,
    pending_test_request: Option<(String, Instant)>,
}

impl HeartbeatManager {
    /// Creates a new heartbeat manager with the specified interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            last_sent: now,
            last_received: now,
            pending_test_request: None,
        }
    }

    /// Records that a message was sent.
    #[inline]
    pub fn on_message_sent(&mut self) {
        self.last_sent = Instant::now();
    }

    /// Records that a message was received.
    ///
    /// Any inbound traffic proves the link is alive, so a pending
    /// TestRequest is cleared.
    pub fn on_message_received(&mut self) {
        self.last_received = Instant::now();
        self.pending_test_request = None;
    }

    /// Returns true if nothing was sent for a full interval.
    #[must_use]
    pub fn should_send_heartbeat(&self) -> bool {
        self.last_sent.elapsed() >= self.interval
    }

    /// Returns true if the counterparty went quiet and no probe is pending.
    #[must_use]
    pub fn should_send_test_request(&self) -> bool {
        self.pending_test_request.is_none()
            && self.last_received.elapsed() >= self.interval + TEST_REQUEST_GRACE
    }

    /// Returns true if a TestRequest went unanswered for a full interval.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.pending_test_request
            .as_ref()
            .is_some_and(|(_, sent_at)| sent_at.elapsed() >= self.interval)
    }

    /// Records that a TestRequest was sent.
    pub fn on_test_request_sent(&mut self, test_req_id: String) {
        let now = Instant::now();
        self.pending_test_request = Some((test_req_id, now));
        self.last_sent = now;
    }

    /// Returns the pending TestRequest ID, if any.
    #[must_use]
    pub fn pending_test_request(&self) -> Option<&str> {
        self.pending_test_request.as_ref().map(|(id, _)| id.as_str())
    }
}

/// Generates a TestReqID from the current UTC time.
#[must_use]
pub fn generate_test_req_id() -> String {
    format!("TEST{}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_should_send_heartbeat() {
        let mut mgr = HeartbeatManager::new(Duration::from_millis(10));
        assert!(!mgr.should_send_heartbeat());

        sleep(Duration::from_millis(15));
        assert!(mgr.should_send_heartbeat());

        mgr.on_message_sent();
        assert!(!mgr.should_send_heartbeat());
    }

    #[test]
    fn test_test_request_cleared_by_traffic() {
        let mut mgr = HeartbeatManager::new(Duration::from_secs(30));

        mgr.on_test_request_sent("TEST123".to_string());
        assert_eq!(mgr.pending_test_request(), Some("TEST123"));
        assert!(!mgr.should_send_test_request());

        mgr.on_message_received();
        assert!(mgr.pending_test_request().is_none());
    }

    #[test]
    fn test_timeout_after_unanswered_probe() {
        let mut mgr = HeartbeatManager::new(Duration::from_millis(10));
        assert!(!mgr.is_timed_out());

        mgr.on_test_request_sent(generate_test_req_id());
        sleep(Duration::from_millis(15));
        assert!(mgr.is_timed_out());
    }

    #[test]
    fn test_generate_test_req_id() {
        let id = generate_test_req_id();
        assert!(id.starts_with("TEST"));
        assert!(id.len() > 4);
    }
}
