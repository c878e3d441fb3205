/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Message routing between the transport and the brokerage handler.
//!
//! [`SessionRouter`] implements the transport-facing [`Application`]
//! callbacks for exactly one session and forwards them to a
//! [`BrokerageHandler`]. Inbound application traffic is classified into
//! [`AppMessage`] and dispatched by exhaustive match.

use crate::signal::LoginSignal;
use async_trait::async_trait;
use fixlink_core::field::tag;
use fixlink_core::identity::SessionIdentity;
use fixlink_core::message::{FixMessage, MessageFactory, MsgType};
use fixlink_core::types::CompId;
use fixlink_session::application::{Application, RejectReason};
use fixlink_session::log::SessionLogger;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// BusinessRejectReason for an unspecified rejection (0 = Other).
const REJECT_OTHER: u32 = 0;

/// Errors a [`BrokerageHandler`] reports for an inbound message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler does not process this message type.
    #[error("unsupported message type {0}")]
    UnsupportedMessageType(MsgType),

    /// The handler refuses the message.
    #[error("message rejected ({code}): {reason}")]
    Rejected {
        /// BusinessRejectReason code.
        code: u32,
        /// Human-readable reason.
        reason: String,
    },
}

impl HandlerError {
    /// Creates a rejection with the generic reason code.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            code: REJECT_OTHER,
            reason: reason.into(),
        }
    }
}

/// Business logic behind the brokerage session.
///
/// The handler owns session readiness: it is expected to report ready after
/// `on_logon` and not ready after `on_logout`.
#[async_trait]
pub trait BrokerageHandler: Send + Sync {
    /// Returns true when the session is logged on and usable.
    fn are_sessions_ready(&self) -> bool;

    /// Handles an inbound admin message (Heartbeat, Logon, Logout, Reject...).
    ///
    /// # Errors
    /// `HandlerError::Rejected` refuses the message.
    async fn handle_admin_message(&self, _message: &FixMessage) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Handles an inbound application message other than execution reports
    /// and cancel rejects.
    ///
    /// # Errors
    /// `HandlerError::UnsupportedMessageType` if the type is not handled.
    async fn handle(&self, message: &FixMessage) -> Result<(), HandlerError> {
        Err(HandlerError::UnsupportedMessageType(message.msg_type().clone()))
    }

    /// Called when the session logs on.
    async fn on_logon(&self, session: &SessionIdentity);

    /// Called when the session logs out or is lost.
    async fn on_logout(&self, session: &SessionIdentity);

    /// Adds handler-specific fields to an outbound admin message (e.g. credentials on Logon).
    async fn enrich_message(&self, _message: &mut FixMessage) {}

    /// Receives an ExecutionReport (35=8).
    async fn on_execution_report(&self, report: &FixMessage);

    /// Receives an OrderCancelReject (35=9).
    async fn on_order_cancel_reject(&self, reject: &FixMessage);

    /// Returns the factory for messages of this session's FIX version.
    fn message_factory(&self) -> MessageFactory {
        MessageFactory::default()
    }
}

/// Inbound application message, classified for dispatch.
#[derive(Debug, Clone, Copy)]
pub enum AppMessage<'a> {
    /// ExecutionReport (35=8).
    ExecutionReport(&'a FixMessage),
    /// OrderCancelReject (35=9).
    OrderCancelReject(&'a FixMessage),
    /// Any other application message.
    Other(&'a FixMessage),
}

impl<'a> From<&'a FixMessage> for AppMessage<'a> {
    fn from(message: &'a FixMessage) -> Self {
        match message.msg_type() {
            MsgType::ExecutionReport => Self::ExecutionReport(message),
            MsgType::OrderCancelReject => Self::OrderCancelReject(message),
            _ => Self::Other(message),
        }
    }
}

/// Routes transport callbacks for one session to a [`BrokerageHandler`].
pub struct SessionRouter {
    identity: SessionIdentity,
    on_behalf_of: Option<CompId>,
    handler: Arc<dyn BrokerageHandler>,
    login: Arc<LoginSignal>,
    logger: Arc<SessionLogger>,
}

impl SessionRouter {
    /// Creates a router bound to `identity`.
    #[must_use]
    pub fn new(
        identity: SessionIdentity,
        on_behalf_of: Option<CompId>,
        handler: Arc<dyn BrokerageHandler>,
        login: Arc<LoginSignal>,
        logger: Arc<SessionLogger>,
    ) -> Self {
        Self {
            identity,
            on_behalf_of,
            handler,
            login,
            logger,
        }
    }

    /// Returns the session this router serves.
    #[must_use]
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    fn is_own(&self, session_id: &SessionIdentity) -> bool {
        if *session_id == self.identity {
            return true;
        }
        warn!(
            session = %self.identity,
            foreign = %session_id,
            "ignoring callback for unknown session"
        );
        false
    }

    fn stamp_on_behalf_of(&self, message: &mut FixMessage) {
        if let Some(on_behalf_of) = &self.on_behalf_of {
            message.set_field(tag::ON_BEHALF_OF_COMP_ID, on_behalf_of);
        }
    }

    async fn dispatch(&self, message: AppMessage<'_>) -> Result<(), HandlerError> {
        match message {
            AppMessage::ExecutionReport(report) => {
                self.handler.on_execution_report(report).await;
                Ok(())
            }
            AppMessage::OrderCancelReject(reject) => {
                self.handler.on_order_cancel_reject(reject).await;
                Ok(())
            }
            AppMessage::Other(other) => self.handler.handle(other).await,
        }
    }
}

impl std::fmt::Debug for SessionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRouter")
            .field("identity", &self.identity)
            .field("on_behalf_of", &self.on_behalf_of)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Application for SessionRouter {
    async fn on_create(&self, session_id: &SessionIdentity) {
        if self.is_own(session_id) {
            self.logger.on_event("session created");
        }
    }

    async fn on_logon(&self, session_id: &SessionIdentity) {
        if !self.is_own(session_id) {
            return;
        }
        self.logger.on_event("logged on");
        self.handler.on_logon(session_id).await;
        self.login.set();
    }

    async fn on_logout(&self, session_id: &SessionIdentity) {
        if !self.is_own(session_id) {
            return;
        }
        self.logger.on_event("logged out");
        self.handler.on_logout(session_id).await;
        self.login.set();
    }

    async fn to_admin(&self, message: &mut FixMessage, session_id: &SessionIdentity) {
        if !self.is_own(session_id) {
            return;
        }
        self.stamp_on_behalf_of(message);
        self.handler.enrich_message(message).await;
    }

    async fn from_admin(
        &self,
        message: &FixMessage,
        session_id: &SessionIdentity,
    ) -> Result<(), RejectReason> {
        if !self.is_own(session_id) {
            return Ok(());
        }
        match self.handler.handle_admin_message(message).await {
            Ok(()) => Ok(()),
            Err(HandlerError::UnsupportedMessageType(msg_type)) => {
                self.logger
                    .on_event(&format!("admin message type {msg_type} not handled"));
                Ok(())
            }
            Err(HandlerError::Rejected { code, reason }) => Err(RejectReason::new(code, reason)),
        }
    }

    async fn to_app(&self, message: &mut FixMessage, session_id: &SessionIdentity) {
        if self.is_own(session_id) {
            self.stamp_on_behalf_of(message);
        }
    }

    async fn from_app(
        &self,
        message: &FixMessage,
        session_id: &SessionIdentity,
    ) -> Result<(), RejectReason> {
        if !self.is_own(session_id) {
            return Ok(());
        }
        match self.dispatch(AppMessage::from(message)).await {
            Ok(()) => Ok(()),
            Err(HandlerError::UnsupportedMessageType(msg_type)) => {
                warn!(
                    session = %self.identity,
                    msg_type = %msg_type,
                    "unsupported application message ignored"
                );
                Ok(())
            }
            Err(HandlerError::Rejected { code, reason }) => Err(RejectReason::new(code, reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingHandler {
        ready: AtomicBool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BrokerageHandler for RecordingHandler {
        fn are_sessions_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn handle(&self, message: &FixMessage) -> Result<(), HandlerError> {
            match message.msg_type() {
                MsgType::BusinessMessageReject => Err(HandlerError::rejected("not today")),
                other => Err(HandlerError::UnsupportedMessageType(other.clone())),
            }
        }

        async fn on_logon(&self, _session: &SessionIdentity) {
            self.ready.store(true, Ordering::SeqCst);
            self.calls.lock().push("logon".into());
        }

        async fn on_logout(&self, _session: &SessionIdentity) {
            self.ready.store(false, Ordering::SeqCst);
            self.calls.lock().push("logout".into());
        }

        async fn enrich_message(&self, message: &mut FixMessage) {
            if *message.msg_type() == MsgType::Logon {
                message.set_field(tag::PASSWORD, "secret");
            }
        }

        async fn on_execution_report(&self, report: &FixMessage) {
            let id = report.get_field(tag::EXEC_ID).unwrap_or_default();
            self.calls.lock().push(format!("exec:{id}"));
        }

        async fn on_order_cancel_reject(&self, _reject: &FixMessage) {
            self.calls.lock().push("cancel_reject".into());
        }
    }

    fn identity(sender: &str) -> SessionIdentity {
        SessionIdentity::new(
            "FIX.4.4",
            CompId::new(sender).unwrap(),
            CompId::new("BROKER").unwrap(),
        )
    }

    fn router(
        on_behalf_of: Option<&str>,
    ) -> (SessionRouter, Arc<RecordingHandler>, Arc<LoginSignal>) {
        let handler = Arc::new(RecordingHandler::default());
        let login = Arc::new(LoginSignal::new());
        let id = identity("CLIENT");
        let router = SessionRouter::new(
            id.clone(),
            on_behalf_of.map(|c| CompId::new(c).unwrap()),
            handler.clone(),
            Arc::clone(&login),
            Arc::new(SessionLogger::new(id, false)),
        );
        (router, handler, login)
    }

    #[tokio::test]
    async fn test_logon_and_logout_set_signal() {
        let (router, handler, login) = router(None);
        let id = identity("CLIENT");

        router.on_logon(&id).await;
        assert!(login.is_set());
        assert!(handler.are_sessions_ready());

        login.reset();
        router.on_logout(&id).await;
        assert!(login.is_set());
        assert!(!handler.are_sessions_ready());
        assert_eq!(*handler.calls.lock(), vec!["logon", "logout"]);
    }

    #[tokio::test]
    async fn test_outbound_stamping() {
        let (router, _, _) = router(Some("DESK"));
        let id = identity("CLIENT");

        let mut logon = FixMessage::new("FIX.4.4", MsgType::Logon);
        router.to_admin(&mut logon, &id).await;
        assert_eq!(logon.get_field(tag::ON_BEHALF_OF_COMP_ID), Some("DESK"));
        assert_eq!(logon.get_field(tag::PASSWORD), Some("secret"));

        let mut order = FixMessage::new("FIX.4.4", MsgType::NewOrderSingle);
        router.to_app(&mut order, &id).await;
        assert_eq!(order.get_field(tag::ON_BEHALF_OF_COMP_ID), Some("DESK"));
        assert!(!order.has_field(tag::PASSWORD));
    }

    #[tokio::test]
    async fn test_inbound_app_dispatch() {
        let (router, handler, _) = router(None);
        let id = identity("CLIENT");

        let mut report = FixMessage::new("FIX.4.4", MsgType::ExecutionReport);
        report.set_field(tag::EXEC_ID, "E1");
        assert!(router.from_app(&report, &id).await.is_ok());

        let reject = FixMessage::new("FIX.4.4", MsgType::OrderCancelReject);
        assert!(router.from_app(&reject, &id).await.is_ok());

        assert_eq!(*handler.calls.lock(), vec!["exec:E1", "cancel_reject"]);
    }

    #[tokio::test]
    async fn test_unsupported_app_message_absorbed() {
        let (router, _, _) = router(None);
        let news = FixMessage::new("FIX.4.4", MsgType::Custom("B".into()));
        assert!(router.from_app(&news, &identity("CLIENT")).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejection_becomes_reject_reason() {
        let (router, _, _) = router(None);
        let msg = FixMessage::new("FIX.4.4", MsgType::BusinessMessageReject);
        let result = router.from_app(&msg, &identity("CLIENT")).await;
        assert_eq!(result, Err(RejectReason::new(0, "not today")));
    }

    #[tokio::test]
    async fn test_foreign_session_ignored() {
        let (router, handler, login) = router(Some("DESK"));
        let other = identity("OTHER");

        router.on_logon(&other).await;
        assert!(!login.is_set());
        assert!(!handler.are_sessions_ready());

        let mut order = FixMessage::new("FIX.4.4", MsgType::NewOrderSingle);
        router.to_app(&mut order, &other).await;
        assert!(!order.has_field(tag::ON_BEHALF_OF_COMP_ID));

        let report = FixMessage::new("FIX.4.4", MsgType::ExecutionReport);
        assert!(router.from_app(&report, &other).await.is_ok());
        assert!(handler.calls.lock().is_empty());
    }

    #[test]
    fn test_app_message_classification() {
        let report = FixMessage::new("FIX.4.4", MsgType::ExecutionReport);
        let other = FixMessage::new("FIX.4.4", MsgType::NewOrderSingle);
        assert!(matches!(
            AppMessage::from(&report),
            AppMessage::ExecutionReport(_)
        ));
        assert!(matches!(AppMessage::from(&other), AppMessage::Other(_)));
    }
}
