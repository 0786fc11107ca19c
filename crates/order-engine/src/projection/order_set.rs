//! The session's authoritative in-process order set.

use crate::model::{Order, OrderId, OrderStatus, OrderView};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// What [`OpenOrderSet::apply`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// First time this order was seen.
    Inserted,
    /// Replaced an older revision.
    Updated { previous: OrderStatus },
    /// Same or older revision than the held copy; ignored.
    Stale,
}

impl Applied {
    pub fn is_stale(self) -> bool {
        matches!(self, Applied::Stale)
    }
}

struct Entry {
    order: Order,
    closed_at: Option<DateTime<Utc>>,
}

/// Orders keyed by id, newest revision wins.
///
/// Terminal orders are kept for `closed_retention` after they close so that late
/// or duplicated feed deliveries are still recognized as stale.
pub struct OpenOrderSet {
    entries: HashMap<OrderId, Entry>,
    closed_retention: Duration,
}

impl OpenOrderSet {
    pub fn new(closed_retention: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            closed_retention,
        }
    }

    pub fn apply(&mut self, order: Order, now: DateTime<Utc>) -> Applied {
        let id = order.id;
        let applied = match self.entries.get(&id) {
            Some(held) if held.order.revision >= order.revision => {
                debug!(order_id = %id, held = held.order.revision, incoming = order.revision, "Stale record");
                return Applied::Stale;
            }
            Some(held) => {
                let previous = held.order.status;
                if previous != order.status && !previous.can_transition_to(order.status) {
                    warn!(order_id = %id, from = %previous, to = %order.status, "Store reports an out-of-graph status change");
                }
                Applied::Updated { previous }
            }
            None => Applied::Inserted,
        };

        let closed_at = if order.status.is_terminal() {
            self.entries
                .get(&id)
                .and_then(|held| held.closed_at)
                .or(Some(now))
        } else {
            None
        };
        self.entries.insert(id, Entry { order, closed_at });
        applied
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.entries.get(id).map(|entry| &entry.order)
    }

    pub fn remove(&mut self, id: &OrderId) -> Option<Order> {
        self.entries.remove(id).map(|entry| entry.order)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.entries.values().map(|entry| &entry.order)
    }

    /// Ids of orders that are not yet completed or cancelled.
    pub fn open_ids(&self) -> Vec<OrderId> {
        self.iter()
            .filter(|order| order.status.is_open())
            .map(|order| order.id)
            .collect()
    }

    /// Drops terminal orders that closed more than `closed_retention` ago.
    pub fn purge_closed(&mut self, now: DateTime<Utc>) -> Vec<OrderId> {
        let retention = self.closed_retention;
        let expired: Vec<OrderId> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.closed_at.is_some_and(|closed| {
                    (now - closed).to_std().unwrap_or(Duration::ZERO) > retention
                })
            })
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.entries.remove(id);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A pure predicate over the order set, used for dashboard tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderFilter {
    #[default]
    All,
    Open,
    Status(OrderStatus),
    Late,
}

impl OrderFilter {
    pub fn matches(&self, view: &OrderView) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::Open => view.order.status.is_open(),
            OrderFilter::Status(status) => view.order.status == *status,
            OrderFilter::Late => view.is_late,
        }
    }
}
