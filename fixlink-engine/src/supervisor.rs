/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Session lifecycle supervisor.
//!
//! The [`Supervisor`] owns the brokerage session: it gates connect attempts on
//! market hours, creates a fresh transport per attempt, waits for the Logon
//! acknowledgement and keeps a background monitor that re-validates the
//! session and reconnects. Consecutive failed connect cycles escalate to a
//! single [`FatalConnectivityError`] on the channel returned by the builder.
//!
//! Connectivity is exposed through lock-free atomics; connect cycles are
//! serialized by an async mutex so two cycles never overlap.

use crate::calendar::MarketCalendar;
use crate::router::{BrokerageHandler, SessionRouter};
use crate::signal::{LoginSignal, LoginWait};
use chrono::Utc;
use fixlink_core::error::{FixError, OrderError, SessionError};
use fixlink_core::field::tag;
use fixlink_core::identity::SessionIdentity;
use fixlink_core::message::FixMessage;
use fixlink_session::application::Application;
use fixlink_session::config::FixConfiguration;
use fixlink_session::log::SessionLogger;
use fixlink_session::transport::{Transport, TransportFactory};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default bound on the wait for a Logon acknowledgement.
pub const DEFAULT_LOGON_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of connect attempts per cycle.
pub const DEFAULT_MAX_CONNECT_ATTEMPTS: u32 = 15;

/// Default pause between monitor health checks.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(60);

/// Default number of consecutive failed cycles before escalation.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Timing and retry limits of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Bound on the wait for a Logon acknowledgement.
    pub logon_timeout: Duration,
    /// Connect attempts per cycle.
    pub max_connect_attempts: u32,
    /// Pause between monitor health checks.
    pub monitor_interval: Duration,
    /// Consecutive failed cycles before the fatal error is raised.
    pub failure_threshold: u32,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            logon_timeout: DEFAULT_LOGON_TIMEOUT,
            max_connect_attempts: DEFAULT_MAX_CONNECT_ATTEMPTS,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// Lifecycle phase of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SupervisorState {
    /// Not connected and not trying (initial state, or market closed).
    Idle = 0,
    /// Creating and starting a transport.
    Connecting = 1,
    /// Waiting for the Logon acknowledgement.
    Authenticating = 2,
    /// Logged on and usable.
    Ready = 3,
    /// Session lost or connect cycle failed.
    Degraded = 4,
    /// Shut down by the owner.
    Terminated = 5,
}

impl SupervisorState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Authenticating,
            3 => Self::Ready,
            4 => Self::Degraded,
            5 => Self::Terminated,
            _ => Self::Idle,
        }
    }
}

/// Raised once when connect cycles keep failing while the market is open.
///
/// The supervisor stops retrying after raising it; restarting is the
/// owner's decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({failures} consecutive failed connect cycles)")]
pub struct FatalConnectivityError {
    /// Human-readable description.
    pub message: String,
    /// Consecutive failed cycles at the time of escalation.
    pub failures: u32,
}

enum CycleOutcome {
    Ready,
    MarketClosed,
    Exhausted,
    Cancelled,
}

enum AttemptOutcome {
    Ready,
    Failed(SessionError),
    Cancelled,
}

/// Collaborators assembled by [`crate::builder::SupervisorBuilder`].
pub(crate) struct SupervisorParts {
    pub config: FixConfiguration,
    pub handler: Arc<dyn BrokerageHandler>,
    pub calendar: Arc<dyn MarketCalendar>,
    pub factory: Arc<dyn TransportFactory>,
    pub router: Arc<SessionRouter>,
    pub login: Arc<LoginSignal>,
    pub logger: Arc<SessionLogger>,
    pub settings: SupervisorSettings,
    pub fatal_tx: mpsc::UnboundedSender<FatalConnectivityError>,
}

struct Shared {
    identity: SessionIdentity,
    config: Mutex<FixConfiguration>,
    handler: Arc<dyn BrokerageHandler>,
    calendar: Arc<dyn MarketCalendar>,
    factory: Arc<dyn TransportFactory>,
    router: Arc<SessionRouter>,
    login: Arc<LoginSignal>,
    logger: Arc<SessionLogger>,
    settings: SupervisorSettings,
    transport: Mutex<Option<Arc<dyn Transport>>>,
    connected: AtomicBool,
    terminated: AtomicBool,
    initialized: AtomicBool,
    fatal_raised: AtomicBool,
    failures: AtomicU32,
    state: AtomicU8,
    cycle: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    fatal_tx: mpsc::UnboundedSender<FatalConnectivityError>,
}

/// Keeps one brokerage FIX session alive.
pub struct Supervisor {
    shared: Arc<Shared>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    pub(crate) fn new(parts: SupervisorParts) -> Self {
        Self {
            shared: Arc::new(Shared {
                identity: parts.config.identity(),
                config: Mutex::new(parts.config),
                handler: parts.handler,
                calendar: parts.calendar,
                factory: parts.factory,
                router: parts.router,
                login: parts.login,
                logger: parts.logger,
                settings: parts.settings,
                transport: Mutex::new(None),
                connected: AtomicBool::new(false),
                terminated: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
                fatal_raised: AtomicBool::new(false),
                failures: AtomicU32::new(0),
                state: AtomicU8::new(SupervisorState::Idle as u8),
                cycle: tokio::sync::Mutex::new(()),
                cancel: CancellationToken::new(),
                fatal_tx: parts.fatal_tx,
            }),
            monitor: Mutex::new(None),
        }
    }

    /// Runs one gated connect cycle, then starts the background monitor.
    ///
    /// Idempotent, and a no-op after [`terminate`](Self::terminate).
    /// Failures are not returned; persistent ones surface on the fatal
    /// error channel.
    pub async fn initialize(&self) {
        if self.shared.terminated.load(Ordering::SeqCst) {
            debug!(session = %self.shared.identity, "initialize after terminate ignored");
            return;
        }
        if self.shared.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.logger.on_event("initializing supervisor");

        let outcome = self.shared.connect_cycle().await;
        if self.shared.record(outcome) || self.shared.cancel.is_cancelled() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(shared.monitor());
        *self.monitor.lock() = Some(handle);
    }

    /// Returns true while the session is logged on, its transport is live
    /// and the supervisor is not terminated. Never blocks.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.shared.terminated.load(Ordering::SeqCst)
            && self.shared.connected.load(Ordering::SeqCst)
            && self.shared.session_alive()
    }

    /// Stops the monitor and the transport. Idempotent; safe before
    /// [`initialize`](Self::initialize).
    pub async fn terminate(&self) {
        if self.shared.terminated.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.cancel.cancel();
        info!(session = %self.shared.identity, "terminating supervisor");

        let monitor = self.monitor.lock().take();
        if let Some(monitor) = monitor
            && let Err(err) = monitor.await
        {
            error!(session = %self.shared.identity, error = %err, "monitor task failed");
        }

        let _cycle = self.shared.cycle.lock().await;
        self.shared.stop_transport().await;
        self.shared.connected.store(false, Ordering::SeqCst);
        self.shared.set_state(SupervisorState::Terminated);
        self.shared.logger.on_event("supervisor terminated");
    }

    /// Hands a built message to the live transport.
    ///
    /// # Errors
    /// `SessionError::Terminated` after termination, `SessionError::NotConnected`
    /// when no logged-on session exists.
    pub async fn send(&self, message: FixMessage) -> Result<(), SessionError> {
        if self.shared.terminated.load(Ordering::SeqCst) {
            return Err(SessionError::Terminated);
        }
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let transport = self
            .shared
            .transport
            .lock()
            .clone()
            .ok_or(SessionError::NotConnected)?;
        transport.send(message).await
    }

    /// Sends an encoded order, refusing messages without OrdType.
    ///
    /// # Errors
    /// `OrderError::MissingOrderType` for unsupported order kinds, otherwise
    /// the errors of [`send`](Self::send).
    pub async fn send_order(&self, message: FixMessage) -> Result<(), FixError> {
        let cl_ord_id = message.get_field(tag::CL_ORD_ID).unwrap_or_default().to_string();
        if !message.has_field(tag::ORD_TYPE) {
            warn!(session = %self.shared.identity, cl_ord_id, "order without OrdType not sent");
            return Err(OrderError::MissingOrderType { cl_ord_id }.into());
        }
        debug!(session = %self.shared.identity, cl_ord_id, "handing order to transport");
        Ok(self.send(message).await?)
    }

    /// Returns the current lifecycle phase.
    ///
    /// A `Ready` session whose transport or handler has gone away reads as
    /// `Degraded` until the monitor reconnects it.
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        match SupervisorState::from_u8(self.shared.state.load(Ordering::SeqCst)) {
            SupervisorState::Ready if !self.shared.session_alive() => SupervisorState::Degraded,
            state => state,
        }
    }

    /// Returns the number of consecutive failed connect cycles.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.shared.failures.load(Ordering::SeqCst)
    }

    /// Returns the supervised session identity.
    #[must_use]
    pub fn identity(&self) -> &SessionIdentity {
        &self.shared.identity
    }

    /// Returns the router registered with every transport.
    #[must_use]
    pub fn router(&self) -> Arc<SessionRouter> {
        Arc::clone(&self.shared.router)
    }

    /// Returns the supervisor settings.
    #[must_use]
    pub fn settings(&self) -> SupervisorSettings {
        self.shared.settings
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.shared.terminated.store(true, Ordering::SeqCst);
        self.shared.cancel.cancel();
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("identity", &self.shared.identity)
            .field("state", &self.state())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn set_state(&self, state: SupervisorState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn market_open(&self) -> bool {
        let now = Utc::now().with_timezone(&self.calendar.exchange_offset());
        self.calendar.is_open(now, true)
    }

    fn session_alive(&self) -> bool {
        self.handler.are_sessions_ready()
            && self
                .transport
                .lock()
                .as_ref()
                .is_some_and(|transport| !transport.is_stopped())
    }

    async fn stop_transport(&self) {
        let transport = self.transport.lock().take();
        if let Some(transport) = transport {
            transport.stop().await;
        }
    }

    async fn connect_cycle(&self) -> CycleOutcome {
        let _cycle = self.cycle.lock().await;
        if self.cancel.is_cancelled() {
            return CycleOutcome::Cancelled;
        }
        if self.session_alive() {
            self.connected.store(true, Ordering::SeqCst);
            self.set_state(SupervisorState::Ready);
            return CycleOutcome::Ready;
        }

        let max_attempts = self.settings.max_connect_attempts;
        for attempt in 1..=max_attempts {
            if !self.market_open() {
                info!(session = %self.identity, "market closed, not connecting");
                if !self.connected.load(Ordering::SeqCst) {
                    self.set_state(SupervisorState::Idle);
                }
                return CycleOutcome::MarketClosed;
            }

            match self.attempt(attempt).await {
                AttemptOutcome::Ready => {
                    self.connected.store(true, Ordering::SeqCst);
                    self.set_state(SupervisorState::Ready);
                    info!(session = %self.identity, attempt, "session ready");
                    return CycleOutcome::Ready;
                }
                AttemptOutcome::Cancelled => return CycleOutcome::Cancelled,
                AttemptOutcome::Failed(err) => {
                    error!(
                        session = %self.identity,
                        attempt,
                        max_attempts,
                        error = %err,
                        "connect attempt failed"
                    );
                }
            }
        }
        CycleOutcome::Exhausted
    }

    async fn attempt(&self, attempt: u32) -> AttemptOutcome {
        self.stop_transport().await;
        self.login.reset();
        self.set_state(SupervisorState::Connecting);

        let created = {
            let mut config = self.config.lock();
            config.reset();
            let application: Arc<dyn Application> = self.router.clone();
            self.factory.create(&config, application)
        };
        let transport = match created {
            Ok(transport) => transport,
            Err(err) => return AttemptOutcome::Failed(err),
        };

        debug!(session = %self.identity, attempt, "starting transport");
        *self.transport.lock() = Some(Arc::clone(&transport));
        if let Err(err) = transport.start().await {
            self.stop_transport().await;
            return AttemptOutcome::Failed(err);
        }

        self.set_state(SupervisorState::Authenticating);
        let timeout = self.settings.logon_timeout;
        let failure = match self.login.wait(timeout, &self.cancel).await {
            LoginWait::Cancelled => return AttemptOutcome::Cancelled,
            LoginWait::Signaled if self.handler.are_sessions_ready() => {
                return AttemptOutcome::Ready;
            }
            LoginWait::Signaled => SessionError::LogonRejected {
                reason: "session not ready after logon exchange".to_string(),
            },
            LoginWait::TimedOut => {
                warn!(session = %self.identity, attempt, "logon acknowledgement timed out");
                SessionError::LogonTimeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
            }
        };

        self.stop_transport().await;
        self.login.reset();
        AttemptOutcome::Failed(failure)
    }

    /// Updates the failure counter; returns true once the fatal error has
    /// been raised.
    fn record(&self, outcome: CycleOutcome) -> bool {
        match outcome {
            CycleOutcome::Ready => {
                self.failures.store(0, Ordering::SeqCst);
                false
            }
            CycleOutcome::MarketClosed | CycleOutcome::Cancelled => false,
            CycleOutcome::Exhausted => {
                let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                self.set_state(SupervisorState::Degraded);
                error!(session = %self.identity, failures, "connect cycle exhausted its attempts");
                if failures < self.settings.failure_threshold {
                    return false;
                }
                self.raise_fatal(failures);
                true
            }
        }
    }

    fn raise_fatal(&self, failures: u32) {
        if self.fatal_raised.swap(true, Ordering::SeqCst) {
            return;
        }
        let fatal = FatalConnectivityError {
            message: format!("unable to establish FIX session {}", self.identity),
            failures,
        };
        error!(session = %self.identity, failures, "{fatal}");
        self.logger.on_event(&fatal.to_string());
        if self.fatal_tx.send(fatal).is_err() {
            warn!(session = %self.identity, "fatal error receiver dropped");
        }
    }

    async fn monitor(self: Arc<Self>) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.monitor_interval) => {}
            }

            if self.connected.load(Ordering::SeqCst) && self.session_alive() {
                continue;
            }
            if self.connected.swap(false, Ordering::SeqCst) {
                warn!(session = %self.identity, "session lost");
                self.set_state(SupervisorState::Degraded);
            }

            let outcome = self.connect_cycle().await;
            if self.record(outcome) {
                break;
            }
        }
        debug!(session = %self.identity, "monitor stopped");
    }
}
