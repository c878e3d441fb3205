/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Per-session logging.
//!
//! A [`SessionLogger`] wraps a `tracing` span tagged with the session
//! identity. The [`LoggerRegistry`] hands out exactly one logger per identity
//! for the lifetime of the process; it is owned by the composition root and
//! shared by reference, never a hidden global.

use fixlink_core::identity::SessionIdentity;
use fixlink_core::message::FixMessage;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Span, debug, info, info_span};

/// Log sink for one FIX session.
#[derive(Debug)]
pub struct SessionLogger {
    identity: SessionIdentity,
    span: Span,
    log_messages: bool,
}

impl SessionLogger {
    /// Creates a logger for the given session.
    ///
    /// # Arguments
    /// * `identity` - The session this logger reports for
    /// * `log_messages` - Whether individual inbound/outbound messages are logged
    #[must_use]
    pub fn new(identity: SessionIdentity, log_messages: bool) -> Self {
        let span = info_span!("fix_session", session = %identity);
        Self {
            identity,
            span,
            log_messages,
        }
    }

    /// Returns the session identity.
    #[must_use]
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    /// Logs a received message when message logging is enabled.
    pub fn on_incoming(&self, message: &FixMessage) {
        if self.log_messages {
            debug!(parent: &self.span, direction = "in", msg_type = %message.msg_type(), "{message}");
        }
    }

    /// Logs a sent message when message logging is enabled.
    pub fn on_outgoing(&self, message: &FixMessage) {
        if self.log_messages {
            debug!(parent: &self.span, direction = "out", msg_type = %message.msg_type(), "{message}");
        }
    }

    /// Logs a session event.
    pub fn on_event(&self, text: &str) {
        info!(parent: &self.span, "{text}");
    }
}

/// Process-wide map from session identity to its logger.
///
/// Append-only: loggers are created on first lookup and never evicted.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    loggers: RwLock<HashMap<SessionIdentity, Arc<SessionLogger>>>,
    log_messages: bool,
}

impl LoggerRegistry {
    /// Creates an empty registry.
    ///
    /// # Arguments
    /// * `log_messages` - Message logging flag applied to every created logger
    #[must_use]
    pub fn new(log_messages: bool) -> Self {
        Self {
            loggers: RwLock::new(HashMap::new()),
            log_messages,
        }
    }

    /// Returns the logger for `identity`, creating it on first use.
    #[must_use]
    pub fn get_or_create(&self, identity: &SessionIdentity) -> Arc<SessionLogger> {
        if let Some(logger) = self.loggers.read().get(identity) {
            return Arc::clone(logger);
        }

        let mut loggers = self.loggers.write();
        Arc::clone(loggers.entry(identity.clone()).or_insert_with(|| {
            Arc::new(SessionLogger::new(identity.clone(), self.log_messages))
        }))
    }

    /// Returns the number of distinct sessions seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loggers.read().len()
    }

    /// Returns true if no logger has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loggers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixlink_core::types::CompId;
    use std::thread;

    fn identity(sender: &str) -> SessionIdentity {
        SessionIdentity::new(
            "FIX.4.4",
            CompId::new(sender).unwrap(),
            CompId::new("BROKER").unwrap(),
        )
    }

    #[test]
    fn test_same_identity_same_logger() {
        let registry = LoggerRegistry::new(false);
        let first = registry.get_or_create(&identity("CLIENT"));
        let second = registry.get_or_create(&identity("CLIENT"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_identity_distinct_logger() {
        let registry = LoggerRegistry::new(true);
        let a = registry.get_or_create(&identity("A"));
        let b = registry.get_or_create(&identity("B"));

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.identity(), &identity("A"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_concurrent_get_or_create() {
        let registry = Arc::new(LoggerRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get_or_create(&identity("CLIENT")))
            })
            .collect();

        let loggers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(loggers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
