/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Session configuration.
//!
//! [`FixConfiguration`] holds everything needed to open the brokerage session.
//! Its [`SessionSettings`] part is the only mutable state: it is reset before
//! every connect attempt so a new transport never inherits stale sequence
//! numbers.

use fixlink_core::identity::SessionIdentity;
use fixlink_core::types::CompId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default FIX version.
pub const DEFAULT_BEGIN_STRING: &str = "FIX.4.4";

/// Default heartbeat interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Sequence-related settings that are cleared before each connect attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Whether the next Logon carries ResetSeqNumFlag=Y (tag 141).
    pub reset_seq_num_flag: bool,
    /// Next outgoing sequence number.
    pub next_sender_seq: u64,
    /// Next expected incoming sequence number.
    pub next_target_seq: u64,
}

impl SessionSettings {
    /// Clears sequence state and requests a sequence reset on the next Logon.
    pub fn reset(&mut self) {
        self.reset_seq_num_flag = true;
        self.next_sender_seq = 1;
        self.next_target_seq = 1;
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reset_seq_num_flag: false,
            next_sender_seq: 1,
            next_target_seq: 1,
        }
    }
}

/// Configuration for the brokerage FIX session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixConfiguration {
    /// Counterparty host name or address.
    pub host: String,
    /// Counterparty port.
    pub port: u16,
    /// Sender CompID (tag 49).
    pub sender_comp_id: CompId,
    /// Target CompID (tag 56).
    pub target_comp_id: CompId,
    /// OnBehalfOfCompID (tag 115) stamped on every outbound message, if set.
    #[serde(default)]
    pub on_behalf_of_comp_id: Option<CompId>,
    /// FIX version BeginString.
    #[serde(default = "default_begin_string")]
    pub begin_string: String,
    /// Heartbeat interval.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: Duration,
    /// Whether individual messages are written to the session log.
    #[serde(default)]
    pub log_messages: bool,
    /// Resettable sequence settings.
    #[serde(default)]
    pub session: SessionSettings,
}

fn default_begin_string() -> String {
    DEFAULT_BEGIN_STRING.to_string()
}

fn default_heartbeat_interval() -> Duration {
    DEFAULT_HEARTBEAT_INTERVAL
}

impl FixConfiguration {
    /// Creates a new configuration with required fields.
    ///
    /// # Arguments
    /// * `host` - Counterparty host
    /// * `port` - Counterparty port
    /// * `sender_comp_id` - Our CompID
    /// * `target_comp_id` - The broker's CompID
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        sender_comp_id: CompId,
        target_comp_id: CompId,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            sender_comp_id,
            target_comp_id,
            on_behalf_of_comp_id: None,
            begin_string: default_begin_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            log_messages: false,
            session: SessionSettings::default(),
        }
    }

    /// Sets the OnBehalfOfCompID.
    #[must_use]
    pub fn with_on_behalf_of(mut self, comp_id: CompId) -> Self {
        self.on_behalf_of_comp_id = Some(comp_id);
        self
    }

    /// Sets the FIX version.
    #[must_use]
    pub fn with_begin_string(mut self, begin_string: impl Into<String>) -> Self {
        self.begin_string = begin_string.into();
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Enables or disables per-message logging.
    #[must_use]
    pub const fn with_log_messages(mut self, enabled: bool) -> Self {
        self.log_messages = enabled;
        self
    }

    /// Returns the identity of the session this configuration opens.
    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity::new(
            self.begin_string.clone(),
            self.sender_comp_id.clone(),
            self.target_comp_id.clone(),
        )
    }

    /// Returns the `host:port` socket address string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Clears stale sequence state before a connect attempt.
    pub fn reset(&mut self) {
        self.session.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FixConfiguration {
        FixConfiguration::new(
            "127.0.0.1",
            9876,
            CompId::new("CLIENT").unwrap(),
            CompId::new("BROKER").unwrap(),
        )
    }

    #[test]
    fn test_fix_configuration_new() {
        let config = config();
        assert_eq!(config.address(), "127.0.0.1:9876");
        assert_eq!(config.begin_string, "FIX.4.4");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert!(config.on_behalf_of_comp_id.is_none());
        assert_eq!(config.identity().to_string(), "FIX.4.4:CLIENT->BROKER");
    }

    #[test]
    fn test_fix_configuration_builders() {
        let config = config()
            .with_on_behalf_of(CompId::new("DESK").unwrap())
            .with_begin_string("FIX.4.2")
            .with_log_messages(true);

        assert_eq!(
            config.on_behalf_of_comp_id.as_ref().map(CompId::as_str),
            Some("DESK")
        );
        assert_eq!(config.identity().begin_string(), "FIX.4.2");
        assert!(config.log_messages);
    }

    #[test]
    fn test_reset_clears_sequence_state() {
        let mut config = config();
        config.session.next_sender_seq = 120;
        config.session.next_target_seq = 98;

        config.reset();
        assert_eq!(config.session.next_sender_seq, 1);
        assert_eq!(config.session.next_target_seq, 1);
        assert!(config.session.reset_seq_num_flag);
    }
}
