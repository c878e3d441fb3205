/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Transport contract.
//!
//! The supervisor never touches sockets directly. It asks a
//! [`TransportFactory`] for a fresh [`Transport`] on every connect attempt,
//! starts it, and stops it when the attempt fails or the owner shuts down.

use crate::application::Application;
use crate::config::FixConfiguration;
use async_trait::async_trait;
use fixlink_core::error::SessionError;
use fixlink_core::message::FixMessage;
use std::sync::Arc;

/// One live (or stopped) connection to the counterparty.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens the connection and sends Logon.
    ///
    /// Completion of the Logon handshake is reported through
    /// [`Application::on_logon`], not through this future.
    ///
    /// # Errors
    /// Returns `SessionError::Connection` if the connection cannot be opened.
    async fn start(&self) -> Result<(), SessionError>;

    /// Logs out if possible and closes the connection. Idempotent.
    async fn stop(&self);

    /// Returns true once the transport has stopped or lost its connection.
    fn is_stopped(&self) -> bool;

    /// Sends an application message over the session.
    ///
    /// # Errors
    /// Returns `SessionError::NotConnected` if the transport is stopped.
    async fn send(&self, message: FixMessage) -> Result<(), SessionError>;
}

/// Creates transports for a session configuration.
pub trait TransportFactory: Send + Sync {
    /// Creates a transport that reports to `application`.
    ///
    /// # Errors
    /// Returns `SessionError::Configuration` if the settings are unusable.
    fn create(
        &self,
        config: &FixConfiguration,
        application: Arc<dyn Application>,
    ) -> Result<Arc<dyn Transport>, SessionError>;
}
