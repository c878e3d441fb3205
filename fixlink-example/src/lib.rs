/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Common utilities shared across examples.

use anyhow::Context;
use async_trait::async_trait;
use fixlink_core::field::tag;
use fixlink_core::identity::SessionIdentity;
use fixlink_core::message::{FixMessage, MsgType};
use fixlink_core::types::CompId;
use fixlink_engine::BrokerageHandler;
use fixlink_session::config::FixConfiguration;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Default broker port.
pub const DEFAULT_PORT: u16 = 9876;

/// Default broker host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Example configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ExampleConfig {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Sender CompID.
    pub sender_comp_id: String,
    /// Target CompID.
    pub target_comp_id: String,
    /// OnBehalfOfCompID, if the broker requires one.
    pub on_behalf_of: Option<String>,
    /// Logon username.
    pub username: Option<String>,
    /// Logon password.
    pub password: Option<String>,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval: u64,
    /// Whether message traffic is logged.
    pub log_messages: bool,
}

impl ExampleConfig {
    /// Reads `FIX_*` environment variables, falling back to local defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env::var("FIX_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("FIX_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            sender_comp_id: env::var("FIX_SENDER").unwrap_or_else(|_| "CLIENT".to_string()),
            target_comp_id: env::var("FIX_TARGET").unwrap_or_else(|_| "BROKER".to_string()),
            on_behalf_of: env::var("FIX_ON_BEHALF_OF").ok(),
            username: env::var("FIX_USERNAME").ok(),
            password: env::var("FIX_PASSWORD").ok(),
            heartbeat_interval: env::var("FIX_HEARTBEAT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            log_messages: env::var("FIX_LOG_MESSAGES").is_ok_and(|v| v == "1" || v == "true"),
        }
    }

    /// Converts into a session configuration.
    ///
    /// # Errors
    /// Returns an error if a CompID is empty or too long.
    pub fn session(&self) -> anyhow::Result<FixConfiguration> {
        let sender = CompId::new(&self.sender_comp_id).context("invalid FIX_SENDER")?;
        let target = CompId::new(&self.target_comp_id).context("invalid FIX_TARGET")?;
        let mut config = FixConfiguration::new(self.host.clone(), self.port, sender, target)
            .with_heartbeat_interval(Duration::from_secs(self.heartbeat_interval))
            .with_log_messages(self.log_messages);
        if let Some(on_behalf_of) = &self.on_behalf_of {
            config = config
                .with_on_behalf_of(CompId::new(on_behalf_of).context("invalid FIX_ON_BEHALF_OF")?);
        }
        Ok(config)
    }
}

/// Initializes logging for examples.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Brokerage handler that logs what it receives and adds credentials to Logon.
#[derive(Debug, Default)]
pub struct LoggingHandler {
    ready: AtomicBool,
    username: Option<String>,
    password: Option<String>,
}

impl LoggingHandler {
    /// Creates a handler that sends the given credentials on Logon.
    #[must_use]
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            username,
            password,
        }
    }
}

#[async_trait]
impl BrokerageHandler for LoggingHandler {
    fn are_sessions_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn on_logon(&self, session: &SessionIdentity) {
        info!(%session, "logged on");
        self.ready.store(true, Ordering::SeqCst);
    }

    async fn on_logout(&self, session: &SessionIdentity) {
        warn!(%session, "logged out");
        self.ready.store(false, Ordering::SeqCst);
    }

    async fn enrich_message(&self, message: &mut FixMessage) {
        if *message.msg_type() != MsgType::Logon {
            return;
        }
        if let Some(username) = &self.username {
            message.set_field(tag::USERNAME, username);
        }
        if let Some(password) = &self.password {
            message.set_field(tag::PASSWORD, password);
        }
    }

    async fn on_execution_report(&self, report: &FixMessage) {
        info!(
            cl_ord_id = report.get_field(tag::CL_ORD_ID).unwrap_or_default(),
            exec_type = report.get_field(tag::EXEC_TYPE).unwrap_or_default(),
            ord_status = report.get_field(tag::ORD_STATUS).unwrap_or_default(),
            "execution report"
        );
    }

    async fn on_order_cancel_reject(&self, reject: &FixMessage) {
        warn!(
            cl_ord_id = reject.get_field(tag::CL_ORD_ID).unwrap_or_default(),
            text = reject.get_field(tag::TEXT).unwrap_or_default(),
            "order cancel rejected"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_adds_credentials_to_logon_only() {
        let handler = LoggingHandler::new(Some("user".into()), Some("secret".into()));

        let mut logon = FixMessage::new("FIX.4.4", MsgType::Logon);
        handler.enrich_message(&mut logon).await;
        assert_eq!(logon.get_field(tag::USERNAME), Some("user"));
        assert_eq!(logon.get_field(tag::PASSWORD), Some("secret"));

        let mut heartbeat = FixMessage::new("FIX.4.4", MsgType::Heartbeat);
        handler.enrich_message(&mut heartbeat).await;
        assert!(!heartbeat.has_field(tag::USERNAME));
    }

    #[tokio::test]
    async fn test_handler_readiness_follows_logon() {
        let handler = LoggingHandler::default();
        let identity = SessionIdentity::new(
            "FIX.4.4",
            CompId::new("CLIENT").unwrap(),
            CompId::new("BROKER").unwrap(),
        );
        assert!(!handler.are_sessions_ready());
        handler.on_logon(&identity).await;
        assert!(handler.are_sessions_ready());
        handler.on_logout(&identity).await;
        assert!(!handler.are_sessions_ready());
    }

    #[test]
    fn test_session_from_example_config() {
        let config = ExampleConfig {
            host: "broker.local".into(),
            port: 9000,
            sender_comp_id: "CLIENT".into(),
            target_comp_id: "BROKER".into(),
            on_behalf_of: Some("DESK".into()),
            username: None,
            password: None,
            heartbeat_interval: 15,
            log_messages: true,
        };
        let session = config.session().unwrap();
        assert_eq!(session.address(), "broker.local:9000");
        assert_eq!(session.heartbeat_interval, Duration::from_secs(15));
        assert!(session.log_messages);
        assert!(session.on_behalf_of_comp_id.is_some());
    }
}
