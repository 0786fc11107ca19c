//! # Order Projection
//!
//! Pure mapping from store rows ([`OrderRecord`]) to engine [`Order`]s.
//!
//! Status strings from the store are loosely typed. [`normalize_status`] is total:
//! canonical names and known legacy synonyms map to their status, and anything else
//! fails closed into [`OrderStatus::Pending`] with a [`StatusDiagnostic`] so an
//! operator can see it. An order is never dropped because of its status text.

pub mod order_set;

pub use order_set::*;

use crate::model::{Customer, DisplayNumber, LineItem, Money, Order, OrderId, OrderStatus, Priority};
use order_store::{collate, OrderRecord};

/// Where a normalized status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOrigin {
    Canonical,
    Legacy,
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMapping {
    pub status: OrderStatus,
    pub origin: StatusOrigin,
}

/// An unrecognized status that was coerced to `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDiagnostic {
    pub order_id: OrderId,
    pub raw_status: String,
}

/// A projected order plus anything the operator should be told about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    pub order: Order,
    pub diagnostic: Option<StatusDiagnostic>,
}

/// Maps a raw status onto the canonical set. Never fails.
pub fn normalize_status(raw: &str) -> StatusMapping {
    let key = collate(raw);

    for status in OrderStatus::ALL {
        if let Some(position) = status.spellings().iter().position(|s| *s == key) {
            let origin = if position == 0 {
                StatusOrigin::Canonical
            } else {
                StatusOrigin::Legacy
            };
            return StatusMapping { status, origin };
        }
    }

    StatusMapping {
        status: OrderStatus::Pending,
        origin: StatusOrigin::Unrecognized,
    }
}

pub fn project(record: &OrderRecord) -> Projected {
    let mapping = normalize_status(&record.status);
    let diagnostic = (mapping.origin == StatusOrigin::Unrecognized).then(|| StatusDiagnostic {
        order_id: record.id,
        raw_status: record.status.clone(),
    });

    let items = record
        .items
        .iter()
        .map(|item| LineItem {
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: Money::from_cents(item.unit_price_cents),
            customizations: item.customizations.clone(),
            note: item.note.clone().filter(|n| !n.trim().is_empty()),
        })
        .collect();

    let order = Order {
        id: record.id,
        display_number: DisplayNumber(record.display_number),
        status: mapping.status,
        items,
        total: Money::from_cents(record.total_cents),
        customer: Customer {
            name: record.customer_name.clone(),
            phone: record.customer_phone.clone(),
            email: record.customer_email.clone(),
        },
        created_at: record.created_at,
        priority: Priority::parse(record.priority.as_deref()),
        special_instructions: record
            .special_instructions
            .clone()
            .filter(|s| !s.trim().is_empty()),
        revision: record.revision,
    };

    Projected { order, diagnostic }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use order_store::OrderItemRecord;

    fn record(status: &str) -> OrderRecord {
        OrderRecord {
            id: OrderId::new(),
            display_number: 12,
            status: status.to_string(),
            items: vec![OrderItemRecord {
                name: "Pho".into(),
                quantity: 2,
                unit_price_cents: 1150,
                customizations: vec!["extra basil".into()],
                note: Some("  ".into()),
            }],
            total_cents: 2300,
            customer_name: "Dana".into(),
            customer_phone: "555-0199".into(),
            customer_email: None,
            created_at: Utc::now(),
            priority: Some("VIP".into()),
            special_instructions: Some("ring bell".into()),
            revision: 3,
        }
    }

    #[test]
    fn test_canonical_and_legacy_statuses() {
        assert_eq!(
            normalize_status("preparing"),
            StatusMapping {
                status: OrderStatus::Preparing,
                origin: StatusOrigin::Canonical
            }
        );
        assert_eq!(
            normalize_status("Confirmed"),
            StatusMapping {
                status: OrderStatus::Pending,
                origin: StatusOrigin::Legacy
            }
        );
        assert_eq!(normalize_status("in-progress").status, OrderStatus::Preparing);
        assert_eq!(normalize_status("Ready For Pickup").status, OrderStatus::Ready);
        assert_eq!(normalize_status("canceled").status, OrderStatus::Cancelled);
        assert_eq!(normalize_status("picked_up").status, OrderStatus::Completed);
    }

    /// Whatever the projection recognizes, the store's comparison accepts for the
    /// same status, so a legacy row never loses a conditional update.
    #[test]
    fn test_recognized_statuses_satisfy_the_store_comparison() {
        for raw in ["Confirmed", " in-progress", "Ready For Pickup", "CANCELED", "done"] {
            let mapping = normalize_status(raw);
            assert_ne!(mapping.origin, StatusOrigin::Unrecognized, "{raw}");
            let expected: Vec<String> =
                mapping.status.spellings().iter().map(|s| s.to_string()).collect();
            assert!(record(raw).status_is_any(&expected), "{raw}");
        }
    }

    #[test]
    fn test_unknown_status_fails_closed_to_pending() {
        let mapping = normalize_status("awaiting_payment");
        assert_eq!(mapping.status, OrderStatus::Pending);
        assert_eq!(mapping.origin, StatusOrigin::Unrecognized);
        assert_eq!(normalize_status("").status, OrderStatus::Pending);
    }

    #[test]
    fn test_project_flags_unrecognized_status() {
        let raw = record("on_hold");
        let projected = project(&raw);
        assert_eq!(projected.order.status, OrderStatus::Pending);
        assert_eq!(
            projected.diagnostic,
            Some(StatusDiagnostic {
                order_id: raw.id,
                raw_status: "on_hold".into()
            })
        );
    }

    #[test]
    fn test_project_copies_fields() {
        let raw = record("ready");
        let Projected { order, diagnostic } = project(&raw);
        assert!(diagnostic.is_none());
        assert_eq!(order.id, raw.id);
        assert_eq!(order.display_number, DisplayNumber(12));
        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(order.total, Money(2300));
        assert_eq!(order.priority, Priority::Vip);
        assert_eq!(order.items[0].line_total(), Money(2300));
        assert_eq!(order.items[0].note, None, "blank notes are dropped");
        assert_eq!(order.special_instructions.as_deref(), Some("ring bell"));
        assert_eq!(order.revision, 3);
        assert_eq!(order.item_count(), 2);
    }
}
