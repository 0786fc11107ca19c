//! # Staleness Monitor
//!
//! Flags `pending` orders that nobody has acknowledged within `late_threshold`.
//! Lateness is derived for presentation only: it never changes an order's status and
//! never fires a notification.

use crate::model::{Order, OrderId, OrderStatus};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

/// `true` only for `pending` orders strictly older than `threshold`.
pub fn is_late(status: OrderStatus, age: Duration, threshold: Duration) -> bool {
    status == OrderStatus::Pending && age > threshold
}

pub struct StalenessMonitor {
    threshold: Duration,
    flagged: HashSet<OrderId>,
}

impl StalenessMonitor {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            flagged: HashSet::new(),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn evaluate(&self, order: &Order, now: DateTime<Utc>) -> bool {
        is_late(order.status, order.age(now), self.threshold)
    }

    /// Recomputes every flag and returns the orders that became late on this tick.
    /// Orders not in `orders` are forgotten.
    pub fn tick<'a>(
        &mut self,
        orders: impl IntoIterator<Item = &'a Order>,
        now: DateTime<Utc>,
    ) -> Vec<OrderId> {
        let mut late = HashSet::new();
        let mut newly_late = Vec::new();

        for order in orders {
            if self.evaluate(order, now) {
                if !self.flagged.contains(&order.id) {
                    info!(order_id = %order.id, order = %order.display_number, age = ?order.age(now), "Order is late");
                    newly_late.push(order.id);
                }
                late.insert(order.id);
            }
        }

        self.flagged = late;
        newly_late
    }

    /// The flag as of the last [`tick`](Self::tick).
    pub fn is_flagged(&self, id: OrderId) -> bool {
        self.flagged.contains(&id)
    }

    pub fn forget(&mut self, id: OrderId) {
        self.flagged.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Customer, DisplayNumber, Money, Priority};
    use chrono::Duration as TimeDelta;

    const THRESHOLD: Duration = Duration::from_secs(15 * 60);

    fn order(status: OrderStatus, created_at: DateTime<Utc>) -> Order {
        Order {
            id: OrderId::new(),
            display_number: DisplayNumber(3),
            status,
            items: vec![],
            total: Money(750),
            customer: Customer {
                name: "Heidi".into(),
                phone: "555-0140".into(),
                email: None,
            },
            created_at,
            priority: Priority::Normal,
            special_instructions: None,
            revision: 1,
        }
    }

    #[test]
    fn test_lateness_boundary() {
        let one = Duration::from_secs(1);
        assert!(!is_late(OrderStatus::Pending, THRESHOLD - one, THRESHOLD));
        assert!(!is_late(OrderStatus::Pending, THRESHOLD, THRESHOLD));
        assert!(is_late(OrderStatus::Pending, THRESHOLD + one, THRESHOLD));
    }

    #[test]
    fn test_only_pending_is_ever_late() {
        let ancient = Duration::from_secs(24 * 3600);
        for status in OrderStatus::ALL {
            assert_eq!(is_late(status, ancient, THRESHOLD), status == OrderStatus::Pending);
        }
    }

    #[test]
    fn test_fresh_order_becomes_late_after_threshold() {
        let mut monitor = StalenessMonitor::new(THRESHOLD);
        let created = Utc::now();
        let fresh = order(OrderStatus::Pending, created);

        assert!(monitor.tick([&fresh], created).is_empty());
        assert!(!monitor.is_flagged(fresh.id));

        let later = created + TimeDelta::minutes(15) + TimeDelta::seconds(1);
        assert_eq!(monitor.tick([&fresh], later), vec![fresh.id]);
        assert!(monitor.is_flagged(fresh.id));

        // Already flagged: not reported again.
        assert!(monitor.tick([&fresh], later + TimeDelta::minutes(1)).is_empty());
    }

    #[test]
    fn test_flag_clears_when_order_moves_on_or_disappears() {
        let mut monitor = StalenessMonitor::new(THRESHOLD);
        let created = Utc::now();
        let mut tracked = order(OrderStatus::Pending, created);
        let later = created + TimeDelta::hours(1);

        monitor.tick([&tracked], later);
        assert!(monitor.is_flagged(tracked.id));

        tracked.status = OrderStatus::Preparing;
        monitor.tick([&tracked], later);
        assert!(!monitor.is_flagged(tracked.id));

        tracked.status = OrderStatus::Pending;
        monitor.tick([&tracked], later);
        monitor.tick(std::iter::empty(), later);
        assert!(!monitor.is_flagged(tracked.id));
    }

    #[test]
    fn test_future_created_at_is_not_late() {
        let monitor = StalenessMonitor::new(THRESHOLD);
        let now = Utc::now();
        assert!(!monitor.evaluate(&order(OrderStatus::Pending, now + TimeDelta::hours(2)), now));
    }
}
