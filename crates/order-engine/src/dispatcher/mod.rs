//! # Notification Dispatcher
//!
//! Turns "this order just entered `pending`" and "this order just entered `ready`"
//! into side effects that fire at most once per order, even though the change feed
//! delivers at least once and in no particular order across orders.
//!
//! ## The seen set
//!
//! The arrival decision is made once per order, on its first sighting: a `pending`
//! first sighting fires the new-order effects, anything else settles silently. The
//! marker stays until the session [`forget`](NotificationDispatcher::forget)s the
//! order, so a later row that maps back to `pending` (an out-of-graph write, or an
//! unrecognized status) never prints a second ticket.
//!
//! `Ready` entries are dropped as soon as the order is observed outside `ready` and
//! also expire after `seen_ttl`.
//!
//! ## Effects
//!
//! The dispatcher only *decides*. It returns a [`Dispatch`] listing:
//!
//! - **New order**: an alert, a toast and a kitchen ticket print
//! - **Ready**: an alert only
//!
//! The session executes them. Printing and alerting are independent: a failed print
//! never suppresses, delays or repeats the alert and toast.

pub mod effects;
pub mod ticket;

pub use effects::*;
pub use ticket::*;

use crate::model::{Order, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// Events the dispatcher deduplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Arrived,
    Ready,
}

pub struct NotificationDispatcher {
    arrivals: HashSet<OrderId>,
    seen: HashMap<(OrderId, EventKind), DateTime<Utc>>,
    seen_ttl: Duration,
    store_name: String,
    tax_rate: f64,
}

impl NotificationDispatcher {
    pub fn new(store_name: impl Into<String>, tax_rate: f64, seen_ttl: Duration) -> Self {
        Self {
            arrivals: HashSet::new(),
            seen: HashMap::new(),
            seen_ttl,
            store_name: store_name.into(),
            tax_rate,
        }
    }

    /// Decides the side effects for one observation of `order`.
    pub fn observe(&mut self, order: &Order, now: DateTime<Utc>) -> Dispatch {
        let first_sighting = self.arrivals.insert(order.id);
        if order.status != OrderStatus::Ready {
            self.seen.remove(&(order.id, EventKind::Ready));
        }

        match order.status {
            OrderStatus::Pending if first_sighting => self.arrival(order),
            OrderStatus::Pending => {
                debug!(order_id = %order.id, "Arrival already dispatched");
                Dispatch::none()
            }
            OrderStatus::Ready if self.mark(order.id, EventKind::Ready, now) => self.ready(order),
            _ => Dispatch::none(),
        }
    }

    /// The lifecycle controller's `preparing → ready` signal. Shares the seen set
    /// with [`observe`](Self::observe), so the feed's echo of the same change is silent.
    pub fn announce_ready(&mut self, order: &Order, now: DateTime<Utc>) -> Dispatch {
        if order.status == OrderStatus::Ready && self.mark(order.id, EventKind::Ready, now) {
            self.ready(order)
        } else {
            Dispatch::none()
        }
    }

    pub fn has_seen(&self, id: OrderId, kind: EventKind) -> bool {
        match kind {
            EventKind::Arrived => self.arrivals.contains(&id),
            EventKind::Ready => self.seen.contains_key(&(id, kind)),
        }
    }

    /// Drops every entry for an order that left the session's view.
    pub fn forget(&mut self, id: OrderId) {
        self.arrivals.remove(&id);
        self.seen.remove(&(id, EventKind::Ready));
    }

    /// Expires `Ready` entries older than `seen_ttl`. Arrival markers live until
    /// [`forget`](Self::forget). Returns how many were dropped.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.seen_ttl;
        let before = self.seen.len();
        self.seen
            .retain(|_, marked| (now - *marked).to_std().unwrap_or(Duration::ZERO) <= ttl);
        before - self.seen.len()
    }

    /// Orders with an arrival marker plus live `Ready` entries.
    pub fn tracked(&self) -> usize {
        self.arrivals.len() + self.seen.len()
    }

    /// `true` if the pair was not yet present.
    fn mark(&mut self, id: OrderId, kind: EventKind, now: DateTime<Utc>) -> bool {
        if self.seen.contains_key(&(id, kind)) {
            debug!(order_id = %id, ?kind, "Already dispatched");
            return false;
        }
        self.seen.insert((id, kind), now);
        true
    }

    fn arrival(&self, order: &Order) -> Dispatch {
        let emphasis = Emphasis::for_priority(order.priority);
        let alert = Alert {
            order_id: order.id,
            display_number: order.display_number,
            kind: AlertKind::NewOrder,
            emphasis,
        };
        let toast = Toast {
            order_id: order.id,
            title: format!("New order {}", order.display_number),
            body: format!("{} · {} items · {}", order.customer.name, order.item_count(), order.total),
            emphasis,
        };
        let ticket = KitchenTicket::from_order(order, &self.store_name, self.tax_rate);

        Dispatch {
            effects: vec![Effect::Alert(alert), Effect::Toast(toast), Effect::Print(ticket)],
        }
    }

    fn ready(&self, order: &Order) -> Dispatch {
        Dispatch {
            effects: vec![Effect::Alert(Alert {
                order_id: order.id,
                display_number: order.display_number,
                kind: AlertKind::OrderReady,
                emphasis: Emphasis::for_priority(order.priority),
            })],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Customer, DisplayNumber, Money, Priority};
    use chrono::Duration as TimeDelta;

    fn order(status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(),
            display_number: DisplayNumber(5),
            status,
            items: vec![],
            total: Money(1899),
            customer: Customer {
                name: "Grace".into(),
                phone: "555-0130".into(),
                email: Some("grace@example.com".into()),
            },
            created_at: Utc::now(),
            priority: Priority::Normal,
            special_instructions: None,
            revision: 1,
        }
    }

    fn dispatcher() -> NotificationDispatcher {
        NotificationDispatcher::new("Harbor Grill", 0.0, Duration::from_secs(3600))
    }

    #[test]
    fn test_duplicate_arrival_dispatches_once() {
        let mut dispatcher = dispatcher();
        let pending = order(OrderStatus::Pending);
        let now = Utc::now();

        let first = dispatcher.observe(&pending, now);
        let second = dispatcher.observe(&pending, now);

        assert_eq!(first.alerts().count(), 1);
        assert_eq!(first.prints().count(), 1);
        assert_eq!(first.effects.len(), 3);
        assert!(second.is_empty());
    }

    #[test]
    fn test_ready_fires_alert_only() {
        let mut dispatcher = dispatcher();
        let ready = order(OrderStatus::Ready);

        let dispatch = dispatcher.observe(&ready, Utc::now());
        assert_eq!(dispatch.effects.len(), 1);
        assert_eq!(dispatch.alerts().next().map(|a| a.kind), Some(AlertKind::OrderReady));
        assert_eq!(dispatch.prints().count(), 0);
    }

    #[test]
    fn test_announce_ready_and_feed_echo_share_the_seen_set() {
        let mut dispatcher = dispatcher();
        let ready = order(OrderStatus::Ready);
        let now = Utc::now();

        assert_eq!(dispatcher.announce_ready(&ready, now).alerts().count(), 1);
        assert!(dispatcher.observe(&ready, now).is_empty());
    }

    #[test]
    fn test_entries_are_evicted_when_status_moves_on() {
        let mut dispatcher = dispatcher();
        let mut tracked = order(OrderStatus::Pending);
        let now = Utc::now();

        dispatcher.observe(&tracked, now);
        assert!(dispatcher.has_seen(tracked.id, EventKind::Arrived));

        tracked.status = OrderStatus::Preparing;
        assert!(dispatcher.observe(&tracked, now).is_empty());
        assert_eq!(dispatcher.tracked(), 1);

        tracked.status = OrderStatus::Ready;
        dispatcher.observe(&tracked, now);
        assert!(dispatcher.has_seen(tracked.id, EventKind::Ready));
        tracked.status = OrderStatus::Completed;
        dispatcher.observe(&tracked, now);
        assert!(!dispatcher.has_seen(tracked.id, EventKind::Ready));

        dispatcher.forget(tracked.id);
        assert_eq!(dispatcher.tracked(), 0);
    }

    #[test]
    fn test_return_to_pending_does_not_refire_arrival() {
        let mut dispatcher = dispatcher();
        let mut tracked = order(OrderStatus::Pending);
        let now = Utc::now();

        assert_eq!(dispatcher.observe(&tracked, now).prints().count(), 1);
        tracked.status = OrderStatus::Preparing;
        dispatcher.observe(&tracked, now);
        tracked.status = OrderStatus::Pending;
        assert!(dispatcher.observe(&tracked, now).is_empty());
    }

    #[test]
    fn test_first_sighting_past_pending_is_silent() {
        let mut dispatcher = dispatcher();
        let mut late = order(OrderStatus::Preparing);
        assert!(dispatcher.observe(&late, Utc::now()).is_empty());
        assert!(dispatcher.observe(&order(OrderStatus::Cancelled), Utc::now()).is_empty());

        late.status = OrderStatus::Pending;
        assert!(dispatcher.observe(&late, Utc::now()).is_empty());
    }

    #[test]
    fn test_vip_is_urgent_but_fires_the_same_effects() {
        let mut dispatcher = dispatcher();
        let mut vip = order(OrderStatus::Pending);
        vip.priority = Priority::Vip;

        let dispatch = dispatcher.observe(&vip, Utc::now());
        assert_eq!(dispatch.effects.len(), 3);
        assert_eq!(dispatch.alerts().next().map(|a| a.emphasis), Some(Emphasis::Urgent));
    }

    #[test]
    fn test_sweep_expires_old_entries() {
        let mut dispatcher = dispatcher();
        let now = Utc::now();
        dispatcher.observe(&order(OrderStatus::Ready), now);

        assert_eq!(dispatcher.sweep(now + TimeDelta::minutes(30)), 0);
        assert_eq!(dispatcher.sweep(now + TimeDelta::minutes(61)), 1);
        assert_eq!(dispatcher.tracked(), 1);
    }
}
