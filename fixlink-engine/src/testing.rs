/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! In-memory collaborators for supervisor and builder tests.

use crate::calendar::MarketCalendar;
use crate::router::BrokerageHandler;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset};
use fixlink_core::error::SessionError;
use fixlink_core::identity::SessionIdentity;
use fixlink_core::message::FixMessage;
use fixlink_core::types::CompId;
use fixlink_session::application::Application;
use fixlink_session::config::FixConfiguration;
use fixlink_session::transport::{Transport, TransportFactory};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn config() -> FixConfiguration {
    FixConfiguration::new(
        "127.0.0.1",
        9876,
        CompId::new("CLIENT").unwrap(),
        CompId::new("BROKER").unwrap(),
    )
}

/// Handler that becomes ready on logon unless `never_ready` is set.
#[derive(Default)]
pub struct FakeHandler {
    pub ready: AtomicBool,
    pub never_ready: bool,
}

impl FakeHandler {
    pub fn never_ready() -> Self {
        Self {
            never_ready: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BrokerageHandler for FakeHandler {
    fn are_sessions_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn on_logon(&self, _session: &SessionIdentity) {
        if !self.never_ready {
            self.ready.store(true, Ordering::SeqCst);
        }
    }

    async fn on_logout(&self, _session: &SessionIdentity) {
        self.ready.store(false, Ordering::SeqCst);
    }

    async fn on_execution_report(&self, _report: &FixMessage) {}

    async fn on_order_cancel_reject(&self, _reject: &FixMessage) {}
}

pub struct FakeTransport {
    application: Arc<dyn Application>,
    identity: SessionIdentity,
    ack_logon: bool,
    fail_start: bool,
    stopped: AtomicBool,
    pub sent: Mutex<Vec<FixMessage>>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn start(&self) -> Result<(), SessionError> {
        if self.fail_start {
            return Err(SessionError::Connection("connection refused".into()));
        }
        self.stopped.store(false, Ordering::SeqCst);
        if self.ack_logon {
            self.application.on_logon(&self.identity).await;
        }
        Ok(())
    }

    async fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    async fn send(&self, message: FixMessage) -> Result<(), SessionError> {
        if self.is_stopped() {
            return Err(SessionError::NotConnected);
        }
        self.sent.lock().push(message);
        Ok(())
    }
}

/// Factory that records every transport it creates.
#[derive(Default)]
pub struct FakeFactory {
    pub ack_logon: bool,
    pub fail_start: bool,
    pub transports: Mutex<Vec<Arc<FakeTransport>>>,
}

impl FakeFactory {
    pub fn acking() -> Self {
        Self {
            ack_logon: true,
            ..Self::default()
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.transports.lock().len()
    }

    pub fn last(&self) -> Option<Arc<FakeTransport>> {
        self.transports.lock().last().cloned()
    }
}

impl TransportFactory for FakeFactory {
    fn create(
        &self,
        config: &FixConfiguration,
        application: Arc<dyn Application>,
    ) -> Result<Arc<dyn Transport>, SessionError> {
        assert!(config.session.reset_seq_num_flag);
        let transport = Arc::new(FakeTransport {
            application,
            identity: config.identity(),
            ack_logon: self.ack_logon,
            fail_start: self.fail_start,
            stopped: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        });
        self.transports.lock().push(Arc::clone(&transport));
        Ok(transport)
    }
}

pub struct ClosedMarket;

impl MarketCalendar for ClosedMarket {
    fn exchange_offset(&self) -> FixedOffset {
        chrono::Utc.fix()
    }

    fn is_open(&self, _at: DateTime<FixedOffset>, _include_extended_hours: bool) -> bool {
        false
    }
}
