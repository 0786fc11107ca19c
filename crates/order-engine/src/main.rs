//! Demo: two terminals working the same store.
//!
//! Seeds a few orders, has the front terminal accept and reject, the kitchen terminal
//! mark ready and complete, and shows both terminals racing on one order.

use clap::Parser;
use order_engine::config::EngineConfig;
use order_engine::model::OrderStatus;
use order_engine::ports::{LogTicketPrinter, TracingAlertSink};
use order_engine::projection::OrderFilter;
use order_engine::runtime::{setup_tracing, Kitchen};
use order_engine::session::{RejectConfirmation, SessionHandle, SessionWarning};
use order_store::{NewOrder, OrderId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn, Instrument};

#[derive(Debug, Parser)]
#[command(name = "order-engine", about = "Runs the order engine demo with two terminals")]
struct Args {
    /// TOML configuration file; defaults are used when absent.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    info!(store = %config.store.name, "Starting order engine demo");

    let mut kitchen = Kitchen::start(config)?;
    let (front, front_warnings) = kitchen.open_session(
        "front",
        Arc::new(TracingAlertSink::new("front")),
        Arc::new(LogTicketPrinter),
    );
    let (line, line_warnings) = kitchen.open_session(
        "line",
        Arc::new(TracingAlertSink::new("line")),
        Arc::new(LogTicketPrinter),
    );
    let front_log = tokio::spawn(log_warnings("front", front_warnings));
    let line_log = tokio::spawn(log_warnings("line", line_warnings));

    let store = kitchen.store().clone();
    let burger = store
        .insert(
            NewOrder::for_customer("Alice", "555-0100")
                .with_item("Cheeseburger", 2, 1150)
                .with_item("Fries", 1, 450)
                .with_instructions("extra napkins"),
        )
        .await?;
    let pizza = store
        .insert(
            NewOrder::for_customer("Bob", "555-0101")
                .with_item("Margherita", 1, 1400)
                .with_priority("vip"),
        )
        .await?;
    let legacy = store
        .insert(
            NewOrder::for_customer("Carol", "555-0102")
                .with_item("Salad", 1, 900)
                .with_status("confirmed"),
        )
        .await?;

    for id in [burger.id, pizza.id, legacy.id] {
        wait_until_known(&front, id).await;
        wait_until_known(&line, id).await;
    }

    async {
        front.accept(burger.id).await?;
        wait_until_status(&line, burger.id, OrderStatus::Preparing).await;
        line.mark_ready(burger.id).await?;
        line.complete(burger.id).await?;

        front.reject(RejectConfirmation::confirm(legacy.id)).await?;
        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .instrument(tracing::info_span!("happy_path"))
    .await?;

    let (first, second) = tokio::join!(front.accept(pizza.id), line.accept(pizza.id));
    match (&first, &second) {
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => info!(error = %e, "Race resolved with one winner"),
        _ => warn!(?first, ?second, "Unexpected race outcome"),
    }

    for view in front.orders(OrderFilter::Open).await? {
        info!(
            order = %view.order.display_number,
            status = %view.order.status,
            late = view.is_late,
            age = ?view.age,
            "Open order"
        );
    }

    drop(front);
    drop(line);
    drop(store);
    kitchen.shutdown().await?;
    let _ = tokio::join!(front_log, line_log);
    Ok(())
}

async fn log_warnings(terminal: &'static str, mut warnings: mpsc::UnboundedReceiver<SessionWarning>) {
    while let Some(warning) = warnings.recv().await {
        warn!(terminal, ?warning, "Session warning");
    }
}

async fn wait_until_known(session: &SessionHandle, id: OrderId) {
    wait_for(session, id, |_| true).await;
}

async fn wait_until_status(session: &SessionHandle, id: OrderId, status: OrderStatus) {
    wait_for(session, id, |s| s == status).await;
}

async fn wait_for(session: &SessionHandle, id: OrderId, accept: impl Fn(OrderStatus) -> bool) {
    for _ in 0..100 {
        if let Ok(views) = session.snapshot().await {
            if views.iter().any(|v| v.order.id == id && accept(v.order.status)) {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    warn!(order_id = %id, "Gave up waiting for order");
}
