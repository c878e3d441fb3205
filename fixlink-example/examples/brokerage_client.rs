//! Brokerage client example.
//!
//! Keeps a FIX 4.4 session alive against `FIX_HOST:FIX_PORT`, sends one
//! limit order once logged on and waits for Ctrl-C.
//!
//! Set `FIX_US_EQUITIES=1` to only connect during US equity hours.

use fixlink_engine::{
    AlwaysOpen, DomainOrder, MarketCalendar, OrderDirection, OrderEncoder, OrderKind,
    SupervisorBuilder, Symbol, WeeklySchedule,
};
use fixlink_example::{ExampleConfig, LoggingHandler, init_logging};
use fixlink_session::log::LoggerRegistry;
use fixlink_transport::TcpInitiatorFactory;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cfg = ExampleConfig::from_env();
    let session = cfg.session()?;
    info!("Brokerage client connecting to {}", session.address());

    let loggers = Arc::new(LoggerRegistry::new(cfg.log_messages));
    let calendar: Arc<dyn MarketCalendar> = if std::env::var("FIX_US_EQUITIES").is_ok() {
        Arc::new(WeeklySchedule::us_equities())
    } else {
        Arc::new(AlwaysOpen)
    };
    let handler = Arc::new(LoggingHandler::new(cfg.username.clone(), cfg.password.clone()));

    let (supervisor, mut fatal) = SupervisorBuilder::new(
        handler,
        Arc::new(TcpInitiatorFactory::new(Arc::clone(&loggers))),
    )
    .add_session(session)
    .with_calendar(calendar)
    .with_logger_registry(loggers)
    .with_max_connect_attempts(3)
    .build()?;

    supervisor.initialize().await;

    if supervisor.is_connected() {
        let encoder = OrderEncoder::default();
        let order = DomainOrder::new(
            "EX-1",
            Symbol::equity("IBM"),
            OrderDirection::Buy,
            dec!(100),
            OrderKind::Limit {
                limit_price: dec!(125.50),
            },
        );
        let message = encoder.encode(&order)?;
        match supervisor.send_order(message).await {
            Ok(()) => info!("Order {} sent", order.id),
            Err(err) => error!("Order {} not sent: {err}", order.id),
        }
    } else {
        warn!("Session not ready, state {:?}", supervisor.state());
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
        Some(err) = fatal.recv() => error!("Giving up: {err}"),
    }

    supervisor.terminate().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
