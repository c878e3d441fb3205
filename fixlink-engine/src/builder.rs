/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Supervisor builder for fluent configuration.

use crate::calendar::{AlwaysOpen, MarketCalendar};
use crate::router::{BrokerageHandler, SessionRouter};
use crate::signal::LoginSignal;
use crate::supervisor::{FatalConnectivityError, Supervisor, SupervisorParts, SupervisorSettings};
use fixlink_core::error::SessionError;
use fixlink_session::config::FixConfiguration;
use fixlink_session::log::LoggerRegistry;
use fixlink_session::transport::TransportFactory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Builder for a [`Supervisor`].
pub struct SupervisorBuilder {
    /// Brokerage callback handler.
    handler: Arc<dyn BrokerageHandler>,
    /// Creates one transport per connect attempt.
    factory: Arc<dyn TransportFactory>,
    /// Market-hours gate.
    calendar: Arc<dyn MarketCalendar>,
    /// Shared per-session logger cache.
    loggers: Option<Arc<LoggerRegistry>>,
    /// Session configurations.
    sessions: Vec<FixConfiguration>,
    /// Timing and retry limits.
    settings: SupervisorSettings,
}

impl SupervisorBuilder {
    /// Creates a builder with default settings and an always-open calendar.
    #[must_use]
    pub fn new(handler: Arc<dyn BrokerageHandler>, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            handler,
            factory,
            calendar: Arc::new(AlwaysOpen),
            loggers: None,
            sessions: Vec::new(),
            settings: SupervisorSettings::default(),
        }
    }

    /// Adds a session configuration.
    #[must_use]
    pub fn add_session(mut self, config: FixConfiguration) -> Self {
        self.sessions.push(config);
        self
    }

    /// Sets the market-hours calendar.
    #[must_use]
    pub fn with_calendar(mut self, calendar: Arc<dyn MarketCalendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Shares a logger cache with the transport factory.
    #[must_use]
    pub fn with_logger_registry(mut self, loggers: Arc<LoggerRegistry>) -> Self {
        self.loggers = Some(loggers);
        self
    }

    /// Sets the Logon acknowledgement timeout.
    #[must_use]
    pub const fn with_logon_timeout(mut self, timeout: Duration) -> Self {
        self.settings.logon_timeout = timeout;
        self
    }

    /// Sets the pause between monitor health checks.
    #[must_use]
    pub const fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.settings.monitor_interval = interval;
        self
    }

    /// Sets the connect attempts per cycle.
    #[must_use]
    pub const fn with_max_connect_attempts(mut self, attempts: u32) -> Self {
        self.settings.max_connect_attempts = attempts;
        self
    }

    /// Sets the consecutive failed cycles tolerated before escalation.
    #[must_use]
    pub const fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.settings.failure_threshold = threshold;
        self
    }

    /// Returns the configured sessions.
    #[must_use]
    pub fn sessions(&self) -> &[FixConfiguration] {
        &self.sessions
    }

    /// Returns the current settings.
    #[must_use]
    pub const fn settings(&self) -> SupervisorSettings {
        self.settings
    }

    /// Builds the supervisor and the receiver of its fatal connectivity error.
    ///
    /// # Errors
    /// `SessionError::Configuration` unless exactly one session is configured
    /// and the attempt and threshold limits are non-zero.
    pub fn build(
        mut self,
    ) -> Result<(Supervisor, mpsc::UnboundedReceiver<FatalConnectivityError>), SessionError> {
        if self.sessions.len() != 1 {
            return Err(SessionError::Configuration(format!(
                "expected exactly one session, got {}",
                self.sessions.len()
            )));
        }
        if self.settings.max_connect_attempts == 0 {
            return Err(SessionError::Configuration(
                "max connect attempts must be at least 1".to_string(),
            ));
        }
        if self.settings.failure_threshold == 0 {
            return Err(SessionError::Configuration(
                "failure threshold must be at least 1".to_string(),
            ));
        }
        let Some(config) = self.sessions.pop() else {
            return Err(SessionError::Configuration("no session configured".to_string()));
        };

        let identity = config.identity();
        let loggers = self
            .loggers
            .unwrap_or_else(|| Arc::new(LoggerRegistry::new(config.log_messages)));
        let logger = loggers.get_or_create(&identity);
        let login = Arc::new(LoginSignal::new());
        let router = Arc::new(SessionRouter::new(
            identity,
            config.on_behalf_of_comp_id.clone(),
            Arc::clone(&self.handler),
            Arc::clone(&login),
            Arc::clone(&logger),
        ));
        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();

        let supervisor = Supervisor::new(SupervisorParts {
            config,
            handler: self.handler,
            calendar: self.calendar,
            factory: self.factory,
            router,
            login,
            logger,
            settings: self.settings,
            fatal_tx,
        });
        Ok((supervisor, fatal_rx))
    }
}

impl std::fmt::Debug for SupervisorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorBuilder")
            .field("sessions", &self.sessions.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_MAX_CONNECT_ATTEMPTS};
    use crate::testing::{FakeFactory, FakeHandler, config};

    fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new(
            Arc::new(FakeHandler::default()),
            Arc::new(FakeFactory::acking()),
        )
    }

    #[test]
    fn test_builder_defaults() {
        let builder = builder();
        assert!(builder.sessions().is_empty());
        assert_eq!(builder.settings(), SupervisorSettings::default());
        assert_eq!(
            builder.settings().max_connect_attempts,
            DEFAULT_MAX_CONNECT_ATTEMPTS
        );
        assert_eq!(builder.settings().failure_threshold, DEFAULT_FAILURE_THRESHOLD);
    }

    #[test]
    fn test_builder_requires_one_session() {
        assert!(matches!(
            builder().build(),
            Err(SessionError::Configuration(_))
        ));
        assert!(matches!(
            builder().add_session(config()).add_session(config()).build(),
            Err(SessionError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder_rejects_zero_limits() {
        assert!(
            builder()
                .add_session(config())
                .with_max_connect_attempts(0)
                .build()
                .is_err()
        );
        assert!(
            builder()
                .add_session(config())
                .with_failure_threshold(0)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_builder_builds_supervisor() {
        let registry = Arc::new(LoggerRegistry::new(false));
        let (supervisor, _fatal) = builder()
            .add_session(config())
            .with_logger_registry(Arc::clone(&registry))
            .with_logon_timeout(Duration::from_secs(3))
            .build()
            .unwrap();

        assert_eq!(supervisor.identity().to_string(), "FIX.4.4:CLIENT->BROKER");
        assert_eq!(supervisor.router().identity(), supervisor.identity());
        assert_eq!(supervisor.settings().logon_timeout, Duration::from_secs(3));
        assert!(!supervisor.is_connected());
        assert_eq!(registry.len(), 1);
    }
}
