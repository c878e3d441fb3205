/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! TCP initiator transport.
//!
//! [`TcpInitiator`] opens one TCP connection, sends Logon and then runs a
//! single task that multiplexes inbound frames, queued outbound messages,
//! heartbeat timing and shutdown. Every inbound and outbound message passes
//! through the [`Application`] callbacks.

use crate::codec::FixCodec;
use async_trait::async_trait;
use bytes::BytesMut;
use fixlink_core::error::SessionError;
use fixlink_core::field::tag;
use fixlink_core::identity::SessionIdentity;
use fixlink_core::message::{FixMessage, MsgType};
use fixlink_core::types::Timestamp;
use fixlink_session::application::{Application, RejectReason};
use fixlink_session::config::FixConfiguration;
use fixlink_session::heartbeat::{HeartbeatManager, generate_test_req_id};
use fixlink_session::log::{LoggerRegistry, SessionLogger};
use fixlink_session::sequence::{SequenceManager, SequenceResult};
use fixlink_session::transport::{Transport, TransportFactory};
use fixlink_tagvalue::{decode_message, encode_message};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Upper bound on the TCP connect itself; the Logon handshake is timed by
/// the caller.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolution of the heartbeat timer.
const TIMER_RESOLUTION: Duration = Duration::from_secs(1);

/// BusinessRejectReason used when the application refuses a message.
const APPLICATION_NOT_AVAILABLE: u32 = 4;

/// Initiator-side FIX transport over plain TCP.
pub struct TcpInitiator {
    config: FixConfiguration,
    identity: SessionIdentity,
    application: Arc<dyn Application>,
    logger: Arc<SessionLogger>,
    outbound: mpsc::UnboundedSender<FixMessage>,
    pending_rx: Mutex<Option<mpsc::UnboundedReceiver<FixMessage>>>,
    running: Arc<AtomicBool>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TcpInitiator {
    /// Creates an initiator that has not connected yet.
    #[must_use]
    pub fn new(
        config: FixConfiguration,
        application: Arc<dyn Application>,
        logger: Arc<SessionLogger>,
    ) -> Self {
        let (outbound, pending_rx) = mpsc::unbounded_channel();
        Self {
            identity: config.identity(),
            config,
            application,
            logger,
            outbound,
            pending_rx: Mutex::new(Some(pending_rx)),
            running: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Returns the identity of the session this transport carries.
    #[must_use]
    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }
}

#[async_trait]
impl Transport for TcpInitiator {
    async fn start(&self) -> Result<(), SessionError> {
        let outbound_rx = self
            .pending_rx
            .lock()
            .take()
            .ok_or_else(|| SessionError::Configuration("transport already started".into()))?;

        self.application.on_create(&self.identity).await;

        let address = self.config.address();
        self.logger.on_event(&format!("connecting to {address}"));
        let stream = match timeout(CONNECT_TIMEOUT, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                self.logger.on_event(&format!("connect failed: {err}"));
                return Err(SessionError::Connection(err.to_string()));
            }
            Err(_) => {
                self.logger.on_event("connect timed out");
                return Err(SessionError::Connection(format!(
                    "connect to {address} timed out"
                )));
            }
        };
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "failed to set TCP_NODELAY");
        }

        let mut connection = Connection {
            framed: Framed::new(stream, FixCodec::new()),
            identity: self.identity.clone(),
            begin_string: self.config.begin_string.clone(),
            application: Arc::clone(&self.application),
            logger: Arc::clone(&self.logger),
            sequence: SequenceManager::from_settings(&self.config.session),
            heartbeat: HeartbeatManager::new(self.config.heartbeat_interval),
            outbound_rx,
            shutdown: self.shutdown.clone(),
            logged_on: false,
            logout_sent: false,
        };

        let mut logon = connection.create(MsgType::Logon);
        logon.set_field(tag::ENCRYPT_METHOD, 0);
        logon.set_field(tag::HEART_BT_INT, self.config.heartbeat_interval.as_secs());
        if self.config.session.reset_seq_num_flag {
            logon.set_field(tag::RESET_SEQ_NUM_FLAG, 'Y');
        }
        connection.transmit(logon).await?;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let handle = tokio::spawn(async move {
            connection.run().await;
            running.store(false, Ordering::SeqCst);
        });
        *self.task.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self) {
        self.shutdown.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(err) = task.await
        {
            error!(session = %self.identity, error = %err, "transport task failed");
        }
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    async fn send(&self, message: FixMessage) -> Result<(), SessionError> {
        if self.is_stopped() {
            return Err(SessionError::NotConnected);
        }
        self.outbound
            .send(message)
            .map_err(|_| SessionError::NotConnected)
    }
}

impl Drop for TcpInitiator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// State owned by the connection task.
struct Connection {
    framed: Framed<TcpStream, FixCodec>,
    identity: SessionIdentity,
    begin_string: String,
    application: Arc<dyn Application>,
    logger: Arc<SessionLogger>,
    sequence: SequenceManager,
    heartbeat: HeartbeatManager,
    outbound_rx: mpsc::UnboundedReceiver<FixMessage>,
    shutdown: CancellationToken,
    logged_on: bool,
    logout_sent: bool,
}

impl Connection {
    fn create(&self, msg_type: MsgType) -> FixMessage {
        FixMessage::new(self.begin_string.clone(), msg_type)
    }

    async fn run(mut self) {
        let mut timer = interval(TIMER_RESOLUTION);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let keep_going = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    if self.logged_on && !self.logout_sent {
                        let _ = self.send_logout(None).await;
                    }
                    false
                }
                frame = self.framed.next() => match frame {
                    Some(Ok(frame)) => self.on_frame(frame).await,
                    Some(Err(err)) => {
                        self.logger.on_event(&format!("framing error: {err}"));
                        false
                    }
                    None => {
                        self.logger.on_event("connection closed by counterparty");
                        false
                    }
                },
                Some(message) = self.outbound_rx.recv() => {
                    self.transmit(message).await.is_ok()
                }
                _ = timer.tick() => self.on_timer().await,
            };
            if !keep_going {
                break;
            }
        }

        if !self.logged_on {
            self.logger.on_event("session ended before logon completed");
        }
        self.logged_on = false;
        self.application.on_logout(&self.identity).await;
        self.logger.on_event("session ended");
    }

    async fn on_timer(&mut self) -> bool {
        if self.heartbeat.is_timed_out() {
            self.logger.on_event("counterparty did not answer TestRequest");
            return false;
        }
        if self.heartbeat.should_send_test_request() {
            let id = generate_test_req_id();
            let mut request = self.create(MsgType::TestRequest);
            request.set_field(tag::TEST_REQ_ID, &id);
            self.heartbeat.on_test_request_sent(id);
            return self.transmit(request).await.is_ok();
        }
        if self.heartbeat.should_send_heartbeat() {
            let heartbeat = self.create(MsgType::Heartbeat);
            return self.transmit(heartbeat).await.is_ok();
        }
        true
    }

    async fn on_frame(&mut self, frame: BytesMut) -> bool {
        let message = match decode_message(&frame) {
            Ok(message) => message,
            Err(err) => {
                warn!(session = %self.identity, error = %err, "dropping undecodable frame");
                return true;
            }
        };
        self.logger.on_incoming(&message);
        self.heartbeat.on_message_received();

        if let Ok(seq) = message.get_field_as::<u64>(tag::MSG_SEQ_NUM) {
            match self.sequence.on_incoming(seq) {
                SequenceResult::Ok => {}
                SequenceResult::Gap { expected, received } => {
                    warn!(session = %self.identity, expected, received, "inbound sequence gap");
                }
                SequenceResult::TooLow { expected, received } => {
                    let poss_dup = message.get_field(tag::POSS_DUP_FLAG) == Some("Y");
                    if !poss_dup && *message.msg_type() != MsgType::SequenceReset {
                        self.logger.on_event(&format!(
                            "MsgSeqNum too low, expected {expected} received {received}"
                        ));
                        let _ = self.send_logout(Some("MsgSeqNum too low")).await;
                        return false;
                    }
                }
            }
        }

        if message.msg_type().is_admin() {
            self.on_admin(message).await
        } else {
            if let Err(reason) = self.application.from_app(&message, &self.identity).await {
                return self.send_business_reject(&message, reason).await.is_ok();
            }
            true
        }
    }

    async fn on_admin(&mut self, message: FixMessage) -> bool {
        let accepted = self.application.from_admin(&message, &self.identity).await;

        match message.msg_type() {
            MsgType::Logon => match accepted {
                Ok(()) => {
                    self.logged_on = true;
                    self.logger.on_event("logon acknowledged");
                    self.application.on_logon(&self.identity).await;
                    true
                }
                Err(reason) => {
                    self.logger
                        .on_event(&format!("logon refused locally: {}", reason.text));
                    let _ = self.send_logout(Some(&reason.text)).await;
                    false
                }
            },
            MsgType::Logout => {
                let text = message.get_field(tag::TEXT).unwrap_or_default();
                self.logger.on_event(&format!("logout received: {text}"));
                if !self.logout_sent {
                    let _ = self.send_logout(None).await;
                }
                false
            }
            MsgType::TestRequest => {
                let mut reply = self.create(MsgType::Heartbeat);
                if let Some(id) = message.get_field(tag::TEST_REQ_ID) {
                    reply.set_field(tag::TEST_REQ_ID, id);
                }
                self.transmit(reply).await.is_ok()
            }
            MsgType::SequenceReset => {
                if let Ok(next) = message.get_field_as::<u64>(tag::NEW_SEQ_NO) {
                    self.sequence.set_target_seq(next);
                }
                true
            }
            MsgType::Reject => {
                warn!(
                    session = %self.identity,
                    ref_seq = message.get_field(tag::REF_SEQ_NUM).unwrap_or_default(),
                    text = message.get_field(tag::TEXT).unwrap_or_default(),
                    "session-level reject received"
                );
                true
            }
            _ => true,
        }
    }

    async fn send_logout(&mut self, text: Option<&str>) -> Result<(), SessionError> {
        let mut logout = self.create(MsgType::Logout);
        if let Some(text) = text {
            logout.set_field(tag::TEXT, text);
        }
        self.logout_sent = true;
        self.transmit(logout).await
    }

    async fn send_business_reject(
        &mut self,
        refused: &FixMessage,
        reason: RejectReason,
    ) -> Result<(), SessionError> {
        let mut reject = self.create(MsgType::BusinessMessageReject);
        if let Some(seq) = refused.get_field(tag::MSG_SEQ_NUM) {
            reject.set_field(tag::REF_SEQ_NUM, seq);
        }
        reject.set_field(tag::REF_MSG_TYPE, refused.msg_type());
        let code = if reason.code == 0 {
            APPLICATION_NOT_AVAILABLE
        } else {
            reason.code
        };
        reject.set_field(tag::BUSINESS_REJECT_REASON, code);
        reject.set_field(tag::TEXT, &reason.text);
        self.transmit(reject).await
    }

    /// Stamps the standard header, runs the outbound callback and writes the frame.
    ///
    /// A message that cannot be encoded is dropped and logged; only socket
    /// failures end the session.
    async fn transmit(&mut self, mut message: FixMessage) -> Result<(), SessionError> {
        message.set_field(tag::SENDER_COMP_ID, self.identity.sender_comp_id());
        message.set_field(tag::TARGET_COMP_ID, self.identity.target_comp_id());
        message.set_field(tag::MSG_SEQ_NUM, self.sequence.allocate_sender_seq());
        message.set_field(tag::SENDING_TIME, Timestamp::now().format_millis());

        if message.msg_type().is_admin() {
            self.application.to_admin(&mut message, &self.identity).await;
        } else {
            self.application.to_app(&mut message, &self.identity).await;
        }

        let frame = match encode_message(&message) {
            Ok(frame) => frame,
            Err(err) => {
                error!(session = %self.identity, msg_type = %message.msg_type(), error = %err, "dropping unencodable message");
                return Ok(());
            }
        };
        self.logger.on_outgoing(&message);

        if let Err(err) = self.framed.send(frame).await {
            self.logger.on_event(&format!("write failed: {err}"));
            return Err(SessionError::Connection(err.to_string()));
        }
        self.heartbeat.on_message_sent();
        Ok(())
    }
}

/// Creates a fresh [`TcpInitiator`] per connect attempt.
///
/// Loggers come from the shared registry so every attempt for the same
/// identity writes to the same session log.
#[derive(Debug, Clone)]
pub struct TcpInitiatorFactory {
    loggers: Arc<LoggerRegistry>,
}

impl TcpInitiatorFactory {
    /// Creates a factory backed by `loggers`.
    #[must_use]
    pub fn new(loggers: Arc<LoggerRegistry>) -> Self {
        Self { loggers }
    }
}

impl TransportFactory for TcpInitiatorFactory {
    fn create(
        &self,
        config: &FixConfiguration,
        application: Arc<dyn Application>,
    ) -> Result<Arc<dyn Transport>, SessionError> {
        if config.host.is_empty() {
            return Err(SessionError::Configuration("host must not be empty".into()));
        }
        if config.port == 0 {
            return Err(SessionError::Configuration("port must not be zero".into()));
        }
        let logger = self.loggers.get_or_create(&config.identity());
        Ok(Arc::new(TcpInitiator::new(
            config.clone(),
            application,
            logger,
        )))
    }
}
