//! # Dashboard Session
//!
//! One [`Session`] per terminal. It owns that terminal's order set, seen set and
//! lateness flags, and mutates them from a single loop. Sessions never share this
//! state; two terminals stay consistent only through the store's conditional update.
//!
//! ## The loop
//!
//! ```text
//!             ┌──────────── operator requests (SessionHandle)
//!             │ ┌────────── change feed
//! Session ◄───┼─┼────────── completions from spawned tasks
//!             │ └────────── staleness tick
//! ```
//!
//! Anything that waits on a collaborator runs on a spawned task and reports back as a
//! completion: conditional updates, reconciliation reads, re-reads after a lost race,
//! feed (re)subscription and ticket prints. The loop itself only waits for its next
//! message, so feed events keep flowing while a transition is in flight.
//!
//! ## Feed gaps
//!
//! When the feed reports `Resumed`, or a subscription first opens, the session
//! re-reads every open order. Orders it held as open that the store no longer lists
//! are fetched one by one to learn how they closed. A failed reconciliation is
//! retried on the next tick.

pub mod handle;
pub mod message;

pub use handle::{RejectConfirmation, SessionError, SessionHandle};
pub use message::{SessionRequest, SessionWarning};

use crate::config::EngineConfig;
use crate::controller::{LifecycleController, TransitionError, TransitionReceipt};
use crate::dispatcher::{Dispatch, Effect, NotificationDispatcher};
use crate::model::{OrderId, OrderView};
use crate::ports::{
    AlertSink, ChangeFeed, FeedMessage, OrderStore, StoreUnavailable, TicketPrinter,
};
use crate::projection::{project, OpenOrderSet, OrderFilter};
use crate::staleness::StalenessMonitor;
use chrono::{DateTime, Utc};
use message::{Completion, Reconciliation, TransitionResponse};
use order_store::OrderRecord;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn, Instrument};

/// The collaborators a session talks to.
#[derive(Clone)]
pub struct SessionPorts {
    pub store: Arc<dyn OrderStore>,
    pub feed: Arc<dyn ChangeFeed>,
    pub alerts: Arc<dyn AlertSink>,
    pub printer: Arc<dyn TicketPrinter>,
}

pub struct Session {
    requests: mpsc::Receiver<SessionRequest>,
    completions: mpsc::UnboundedReceiver<Completion>,
    tick_interval: Duration,
    core: SessionCore,
}

impl Session {
    /// Builds a session that is not yet running. Spawn [`run`](Session::run) to start it.
    ///
    /// `config` must pass [`EngineConfig::validate`]; [`Kitchen::start`] checks this.
    /// A zero `staleness.tick_interval` makes [`run`](Session::run) panic.
    ///
    /// [`Kitchen::start`]: crate::runtime::Kitchen::start
    pub fn new(
        name: impl Into<String>,
        config: &EngineConfig,
        ports: SessionPorts,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionWarning>) {
        let (request_tx, requests) = mpsc::channel(32);
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let (warning_tx, warnings) = mpsc::unbounded_channel();

        let core = SessionCore {
            name: name.into(),
            controller: LifecycleController::new(
                ports.store.clone(),
                config.lifecycle.transition_timeout,
            ),
            orders: OpenOrderSet::new(config.projection.closed_retention),
            dispatcher: NotificationDispatcher::new(
                config.store.name.clone(),
                config.ticket.tax_rate,
                config.dispatch.seen_ttl,
            ),
            staleness: StalenessMonitor::new(config.staleness.late_threshold),
            unrecognized: HashMap::new(),
            ports,
            feed: None,
            subscribing: false,
            reconciling: false,
            reconcile_again: false,
            needs_reconcile: false,
            gap_open: false,
            completions: completion_tx,
            warnings: warning_tx,
        };

        let session = Self {
            requests,
            completions,
            tick_interval: config.staleness.tick_interval,
            core,
        };
        (session, SessionHandle::new(request_tx), warnings)
    }

    /// Runs until every [`SessionHandle`] is dropped.
    #[instrument(skip_all, fields(terminal = %self.core.name))]
    pub async fn run(self) {
        let Session {
            mut requests,
            mut completions,
            tick_interval,
            mut core,
        } = self;

        info!("Session started");
        core.start_subscribe();

        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(request) => core.on_request(request),
                    None => break,
                },
                message = next_feed(&mut core.feed) => core.on_feed(message),
                Some(completion) = completions.recv() => core.on_completion(completion),
                _ = ticker.tick() => core.on_tick(Utc::now()),
            }
        }

        info!(orders = core.orders.len(), "Session shutdown");
    }
}

async fn next_feed(feed: &mut Option<mpsc::Receiver<FeedMessage>>) -> Option<FeedMessage> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

struct SessionCore {
    name: String,
    ports: SessionPorts,
    controller: LifecycleController,
    orders: OpenOrderSet,
    dispatcher: NotificationDispatcher,
    staleness: StalenessMonitor,
    /// Raw status text of orders that projected as `pending` by default.
    unrecognized: HashMap<OrderId, String>,
    feed: Option<mpsc::Receiver<FeedMessage>>,
    subscribing: bool,
    reconciling: bool,
    reconcile_again: bool,
    needs_reconcile: bool,
    gap_open: bool,
    completions: mpsc::UnboundedSender<Completion>,
    warnings: mpsc::UnboundedSender<SessionWarning>,
}

impl SessionCore {
    fn on_request(&mut self, request: SessionRequest) {
        match request {
            SessionRequest::Transition {
                id,
                target,
                respond_to,
            } => {
                let Some(order) = self.orders.get(&id).cloned() else {
                    let _ = respond_to.send(Err(TransitionError::UnknownOrder(id)));
                    return;
                };
                if let Some(raw_status) = self.unrecognized.get(&id) {
                    debug!(order_id = %id, %raw_status, "Transition refused, status not recognized");
                    let _ = respond_to.send(Err(TransitionError::UnrecognizedStatus {
                        order_id: id,
                        raw_status: raw_status.clone(),
                    }));
                    return;
                }
                if let Err(e) = LifecycleController::check(&order, target) {
                    debug!(order_id = %id, error = %e, "Transition refused");
                    let _ = respond_to.send(Err(e));
                    return;
                }

                let controller = self.controller.clone();
                let completions = self.completions.clone();
                tokio::spawn(
                    async move {
                        let result = controller.request_transition(&order, target).await;
                        let _ = completions.send(Completion::TransitionSettled {
                            id,
                            result,
                            respond_to,
                        });
                    }
                    .in_current_span(),
                );
            }
            SessionRequest::Snapshot { filter, respond_to } => {
                let _ = respond_to.send(self.views(filter, Utc::now()));
            }
        }
    }

    fn on_feed(&mut self, message: Option<FeedMessage>) {
        match message {
            Some(FeedMessage::Change(record)) => self.ingest(&record, Utc::now()),
            Some(FeedMessage::Disconnected) => self.feed_lost(),
            Some(FeedMessage::Resumed) => {
                info!("Change feed resumed, reconciling");
                self.start_reconcile();
            }
            None => {
                self.feed = None;
                self.feed_lost();
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        let now = Utc::now();
        match completion {
            Completion::TransitionSettled {
                id,
                result,
                respond_to,
            } => self.settle_transition(id, result, respond_to, now),
            Completion::Reconciled(result) => self.finish_reconcile(result, now),
            Completion::Refreshed { id, result } => match result {
                Ok(Some(record)) => self.ingest(&record, now),
                Ok(None) => self.remove_order(id),
                Err(e) => warn!(order_id = %id, error = %e, "Re-read failed"),
            },
            Completion::Subscribed(result) => {
                self.subscribing = false;
                match result {
                    Ok(feed) => {
                        info!("Change feed subscribed");
                        self.feed = Some(feed);
                        self.start_reconcile();
                    }
                    Err(e) => {
                        warn!(error = %e, "Change feed subscription failed, retrying on next tick");
                        self.feed_lost();
                    }
                }
            }
            Completion::Printed {
                order_id,
                display_number,
                result,
            } => match result {
                Ok(()) => debug!(%order_id, "Ticket printed"),
                Err(error) => {
                    warn!(%order_id, %error, "Ticket print failed");
                    self.warn(SessionWarning::PrintFailed {
                        order_id,
                        display_number,
                        error,
                    });
                }
            },
        }
    }

    fn on_tick(&mut self, now: DateTime<Utc>) {
        let newly_late = self.staleness.tick(self.orders.iter(), now);
        if !newly_late.is_empty() {
            debug!(count = newly_late.len(), "Orders turned late");
        }

        let expired = self.dispatcher.sweep(now);
        if expired > 0 {
            debug!(expired, "Seen set swept");
        }
        for id in self.orders.purge_closed(now) {
            self.unrecognized.remove(&id);
            self.dispatcher.forget(id);
            self.staleness.forget(id);
        }

        if self.feed.is_none() {
            self.start_subscribe();
        } else if self.needs_reconcile {
            self.start_reconcile();
        }
    }

    /// Projects a store row into the order set and runs whatever it newly triggers.
    fn ingest(&mut self, record: &OrderRecord, now: DateTime<Utc>) {
        let projected = project(record);
        let id = projected.order.id;
        if self.orders.apply(projected.order, now).is_stale() {
            return;
        }

        match projected.diagnostic {
            Some(diagnostic) => {
                warn!(order_id = %id, raw_status = %diagnostic.raw_status, "Unrecognized order status, treating as pending");
                self.unrecognized.insert(id, diagnostic.raw_status.clone());
                self.warn(SessionWarning::UnrecognizedStatus {
                    order_id: diagnostic.order_id,
                    raw_status: diagnostic.raw_status,
                });
            }
            None => {
                self.unrecognized.remove(&id);
            }
        }

        let Some(order) = self.orders.get(&id) else {
            return;
        };
        if order.status.is_terminal() {
            self.staleness.forget(id);
        }
        let dispatch = self.dispatcher.observe(order, now);
        self.execute(dispatch);
    }

    fn settle_transition(
        &mut self,
        id: OrderId,
        result: Result<TransitionReceipt, TransitionError>,
        respond_to: TransitionResponse,
        now: DateTime<Utc>,
    ) {
        match &result {
            Ok(receipt) => {
                info!(order_id = %id, from = %receipt.from, to = %receipt.to, "Transition settled");
                if !self.orders.apply(receipt.order.clone(), now).is_stale() {
                    self.unrecognized.remove(&id);
                    if receipt.order.status.is_terminal() {
                        self.staleness.forget(id);
                    }
                    let dispatch = if receipt.announces_ready() {
                        self.dispatcher.announce_ready(&receipt.order, now)
                    } else {
                        self.dispatcher.observe(&receipt.order, now)
                    };
                    self.execute(dispatch);
                }
            }
            Err(e) if e.requires_reread() => {
                warn!(order_id = %id, error = %e, "Transition failed, re-reading order");
                self.start_refresh(id);
            }
            Err(e) => debug!(order_id = %id, error = %e, "Transition failed"),
        }
        let _ = respond_to.send(result);
    }

    fn finish_reconcile(
        &mut self,
        result: Result<Reconciliation, StoreUnavailable>,
        now: DateTime<Utc>,
    ) {
        self.reconciling = false;
        match result {
            Ok(reconciliation) => {
                let reconciled = reconciliation.open.len();
                for record in &reconciliation.open {
                    self.ingest(record, now);
                }
                for (id, record) in reconciliation.departed {
                    match record {
                        Some(record) => self.ingest(&record, now),
                        None => self.remove_order(id),
                    }
                }
                self.needs_reconcile = false;
                info!(reconciled, "Reconciled open orders");
                if self.gap_open {
                    self.gap_open = false;
                    self.warn(SessionWarning::FeedResumed { reconciled });
                }
            }
            Err(e) => {
                warn!(error = %e, "Reconciliation failed, retrying on next tick");
                self.needs_reconcile = true;
                self.warn(SessionWarning::ReconcileFailed {
                    error: e.to_string(),
                });
            }
        }

        if std::mem::take(&mut self.reconcile_again) {
            self.start_reconcile();
        }
    }

    fn feed_lost(&mut self) {
        warn!("Change feed disconnected");
        if !self.gap_open {
            self.gap_open = true;
            self.warn(SessionWarning::FeedDisconnected);
        }
    }

    fn start_subscribe(&mut self) {
        if self.subscribing {
            return;
        }
        self.subscribing = true;
        let feed = self.ports.feed.clone();
        let completions = self.completions.clone();
        tokio::spawn(
            async move {
                let result = feed.subscribe().await;
                let _ = completions.send(Completion::Subscribed(result));
            }
            .in_current_span(),
        );
    }

    fn start_reconcile(&mut self) {
        if self.reconciling {
            self.reconcile_again = true;
            return;
        }
        self.reconciling = true;
        let store = self.ports.store.clone();
        let held_open = self.orders.open_ids();
        let completions = self.completions.clone();
        tokio::spawn(
            async move {
                let result = reconcile(store.as_ref(), held_open).await;
                let _ = completions.send(Completion::Reconciled(result));
            }
            .in_current_span(),
        );
    }

    fn start_refresh(&self, id: OrderId) {
        let store = self.ports.store.clone();
        let completions = self.completions.clone();
        tokio::spawn(
            async move {
                let result = store.fetch_order(id).await;
                let _ = completions.send(Completion::Refreshed { id, result });
            }
            .in_current_span(),
        );
    }

    /// Alerts and toasts run inline; prints are handed to a task.
    fn execute(&self, dispatch: Dispatch) {
        for effect in dispatch {
            match effect {
                Effect::Alert(alert) => self.ports.alerts.play_alert(&alert),
                Effect::Toast(toast) => self.ports.alerts.show_toast(&toast),
                Effect::Print(ticket) => {
                    let printer = self.ports.printer.clone();
                    let completions = self.completions.clone();
                    tokio::spawn(
                        async move {
                            let order_id = ticket.order_id;
                            let display_number = ticket.display_number;
                            let result = printer.print(ticket).await;
                            let _ = completions.send(Completion::Printed {
                                order_id,
                                display_number,
                                result,
                            });
                        }
                        .in_current_span(),
                    );
                }
            }
        }
    }

    fn remove_order(&mut self, id: OrderId) {
        debug!(order_id = %id, "Order gone from store");
        self.orders.remove(&id);
        self.unrecognized.remove(&id);
        self.dispatcher.forget(id);
        self.staleness.forget(id);
    }

    fn views(&self, filter: OrderFilter, now: DateTime<Utc>) -> Vec<OrderView> {
        let mut views: Vec<OrderView> = self
            .orders
            .iter()
            .map(|order| OrderView {
                is_late: self.staleness.evaluate(order, now),
                age: order.age(now),
                order: order.clone(),
            })
            .filter(|view| filter.matches(view))
            .collect();
        views.sort_by_key(|view| (view.order.created_at, view.order.display_number));
        views
    }

    fn warn(&self, warning: SessionWarning) {
        let _ = self.warnings.send(warning);
    }
}

async fn reconcile(
    store: &dyn OrderStore,
    held_open: Vec<OrderId>,
) -> Result<Reconciliation, StoreUnavailable> {
    let open = store.open_orders().await?;
    let listed: HashSet<OrderId> = open.iter().map(|record| record.id).collect();

    let mut departed = Vec::new();
    for id in held_open.into_iter().filter(|id| !listed.contains(id)) {
        departed.push((id, store.fetch_order(id).await?));
    }
    Ok(Reconciliation { open, departed })
}
