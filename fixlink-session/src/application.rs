/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Application callback interface.
//!
//! The transport invokes these callbacks for every session event and every
//! message in either direction, following the QuickFIX pattern with async
//! support.

use async_trait::async_trait;
use fixlink_core::identity::SessionIdentity;
use fixlink_core::message::FixMessage;

/// Reason for rejecting an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectReason {
    /// Rejection reason code.
    pub code: u32,
    /// Human-readable rejection text.
    pub text: String,
}

impl RejectReason {
    /// Creates a new rejection reason.
    #[must_use]
    pub fn new(code: u32, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }
}

/// Callbacks the transport drives for one session.
#[async_trait]
pub trait Application: Send + Sync {
    /// Called when a session is created.
    async fn on_create(&self, session_id: &SessionIdentity);

    /// Called on successful logon.
    async fn on_logon(&self, session_id: &SessionIdentity);

    /// Called on logout or session loss.
    async fn on_logout(&self, session_id: &SessionIdentity);

    /// Called before sending an admin message (Logon, Heartbeat, etc.).
    ///
    /// The message may be modified in place.
    async fn to_admin(&self, message: &mut FixMessage, session_id: &SessionIdentity);

    /// Called when an admin message is received.
    ///
    /// # Returns
    /// `Ok(())` to accept, `Err(RejectReason)` to reject.
    #[allow(clippy::wrong_self_convention)]
    async fn from_admin(
        &self,
        message: &FixMessage,
        session_id: &SessionIdentity,
    ) -> Result<(), RejectReason>;

    /// Called before sending an application message.
    ///
    /// The message may be modified in place.
    async fn to_app(&self, message: &mut FixMessage, session_id: &SessionIdentity);

    /// Called when an application message is received.
    ///
    /// # Returns
    /// `Ok(())` to accept, `Err(RejectReason)` to reject.
    #[allow(clippy::wrong_self_convention)]
    async fn from_app(
        &self,
        message: &FixMessage,
        session_id: &SessionIdentity,
    ) -> Result<(), RejectReason>;
}

/// Application that accepts everything and does nothing.
#[derive(Debug, Default)]
pub struct NoOpApplication;

#[async_trait]
impl Application for NoOpApplication {
    async fn on_create(&self, _session_id: &SessionIdentity) {}

    async fn on_logon(&self, _session_id: &SessionIdentity) {}

    async fn on_logout(&self, _session_id: &SessionIdentity) {}

    async fn to_admin(&self, _message: &mut FixMessage, _session_id: &SessionIdentity) {}

    async fn from_admin(
        &self,
        _message: &FixMessage,
        _session_id: &SessionIdentity,
    ) -> Result<(), RejectReason> {
        Ok(())
    }

    async fn to_app(&self, _message: &mut FixMessage, _session_id: &SessionIdentity) {}

    async fn from_app(
        &self,
        _message: &FixMessage,
        _session_id: &SessionIdentity,
    ) -> Result<(), RejectReason> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixlink_core::message::MsgType;
    use fixlink_core::types::CompId;

    #[test]
    fn test_reject_reason() {
        let reason = RejectReason::new(3, "Unsupported message type");
        assert_eq!(reason.code, 3);
        assert_eq!(reason.text, "Unsupported message type");
    }

    #[tokio::test]
    async fn test_noop_application_accepts() {
        let app = NoOpApplication;
        let session_id = SessionIdentity::new(
            "FIX.4.4",
            CompId::new("CLIENT").unwrap(),
            CompId::new("BROKER").unwrap(),
        );
        let mut msg = FixMessage::new("FIX.4.4", MsgType::Heartbeat);

        app.on_create(&session_id).await;
        app.to_admin(&mut msg, &session_id).await;
        assert_eq!(msg.field_count(), 0);
        assert!(app.from_admin(&msg, &session_id).await.is_ok());
        assert!(app.from_app(&msg, &session_id).await.is_ok());
    }
}
