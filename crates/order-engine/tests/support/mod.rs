#![allow(dead_code)]

use async_trait::async_trait;
use order_engine::config::EngineConfig;
use order_engine::dispatcher::{Alert, AlertKind, KitchenTicket, Toast};
use order_engine::model::{OrderId, OrderStatus, OrderView};
use order_engine::ports::{AlertSink, ChangeFeed, FeedError, FeedMessage, PrintError, TicketPrinter};
use order_engine::session::{SessionHandle, SessionWarning};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Records every alert and toast.
#[derive(Default)]
pub struct RecordingAlerts {
    alerts: Mutex<Vec<Alert>>,
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingAlerts {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub fn count(&self, id: OrderId, kind: AlertKind) -> usize {
        self.alerts()
            .iter()
            .filter(|a| a.order_id == id && a.kind == kind)
            .count()
    }
}

impl AlertSink for RecordingAlerts {
    fn play_alert(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }

    fn show_toast(&self, toast: &Toast) {
        self.toasts.lock().unwrap().push(toast.clone());
    }
}

/// Records tickets; fails every print while `failing` is set.
#[derive(Default)]
pub struct RecordingPrinter {
    printed: Mutex<Vec<KitchenTicket>>,
    attempts: Mutex<usize>,
    failing: AtomicBool,
}

impl RecordingPrinter {
    pub fn failing() -> Self {
        let printer = Self::default();
        printer.failing.store(true, Ordering::SeqCst);
        printer
    }

    pub fn printed(&self) -> Vec<KitchenTicket> {
        self.printed.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl TicketPrinter for RecordingPrinter {
    async fn print(&self, ticket: KitchenTicket) -> Result<(), PrintError> {
        *self.attempts.lock().unwrap() += 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(PrintError::Unreachable("paper jam".into()));
        }
        self.printed.lock().unwrap().push(ticket);
        Ok(())
    }
}

/// Short durations so feed reconnects and ticks happen quickly in tests.
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.store.name = "Test Kitchen".into();
    config.feed.reconnect_delay = Duration::from_millis(20);
    config.staleness.tick_interval = Duration::from_millis(50);
    config.lifecycle.transition_timeout = Duration::from_millis(500);
    config
}

/// Polls the session until `accept` holds for the order, or panics after ~2s.
pub async fn wait_for_order(
    session: &SessionHandle,
    id: OrderId,
    accept: impl Fn(&OrderView) -> bool,
) -> OrderView {
    for _ in 0..200 {
        let views = session.snapshot().await.expect("session closed");
        if let Some(view) = views.into_iter().find(|v| v.order.id == id) {
            if accept(&view) {
                return view;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("order {id} never reached the expected state");
}

pub async fn wait_for_status(session: &SessionHandle, id: OrderId, status: OrderStatus) -> OrderView {
    wait_for_order(session, id, |v| v.order.status == status).await
}

/// Polls until `check` passes, or panics after ~2s.
pub async fn eventually(what: &str, check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Receives warnings until one matches, or panics after ~2s.
pub async fn expect_warning(
    warnings: &mut mpsc::UnboundedReceiver<SessionWarning>,
    matches: impl Fn(&SessionWarning) -> bool,
) -> SessionWarning {
    let deadline = tokio::time::sleep(Duration::from_secs(2));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            warning = warnings.recv() => match warning {
                Some(warning) if matches(&warning) => return warning,
                Some(_) => continue,
                None => panic!("warning channel closed"),
            },
            _ = &mut deadline => panic!("expected warning never arrived"),
        }
    }
}

/// A change feed driven by hand. Each `subscribe` hands out the next queued receiver.
pub struct ScriptedFeed {
    receivers: Mutex<VecDeque<mpsc::Receiver<FeedMessage>>>,
}

impl ScriptedFeed {
    /// One subscription's worth of feed, plus the sender that drives it.
    pub fn new() -> (Arc<Self>, mpsc::Sender<FeedMessage>) {
        let (tx, rx) = mpsc::channel(64);
        let feed = Self {
            receivers: Mutex::new(VecDeque::from([rx])),
        };
        (Arc::new(feed), tx)
    }
}

#[async_trait]
impl ChangeFeed for ScriptedFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<FeedMessage>, FeedError> {
        self.receivers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| FeedError::Subscribe("no subscription scripted".into()))
    }
}

/// Relays another feed, holding messages back while the gate is locked.
///
/// Locking the gate stops the relay from draining its upstream, so a bounded
/// upstream backs up exactly as it would behind a stalled terminal.
pub struct GatedFeed {
    upstream: Arc<dyn ChangeFeed>,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl GatedFeed {
    pub fn new(upstream: impl ChangeFeed + 'static) -> (Arc<Self>, Arc<tokio::sync::Mutex<()>>) {
        let gate = Arc::new(tokio::sync::Mutex::new(()));
        let feed = Self {
            upstream: Arc::new(upstream),
            gate: gate.clone(),
        };
        (Arc::new(feed), gate)
    }
}

#[async_trait]
impl ChangeFeed for GatedFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<FeedMessage>, FeedError> {
        let mut upstream = self.upstream.subscribe().await?;
        let gate = self.gate.clone();
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            loop {
                drop(gate.lock().await);
                let Some(message) = upstream.recv().await else {
                    return;
                };
                if tx.send(message).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}
