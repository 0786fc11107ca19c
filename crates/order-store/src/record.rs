//! # Store Records
//!
//! Row types as the store keeps them. Nothing here is normalized: `status` and
//! `priority` are whatever string the writer used, including legacy spellings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Opaque, store-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Allocates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "order_{}", self.0.simple())
    }
}

/// A line item row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub customizations: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// An order row together with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub display_number: u32,
    pub status: String,
    pub items: Vec<OrderItemRecord>,
    pub total_cents: i64,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    /// Incremented on every write to the row, starting at 1 on insert.
    pub revision: u64,
}

/// Payload for inserting a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Initial status; `None` stores `"pending"`.
    pub status: Option<String>,
    pub items: Vec<NewOrderItem>,
    /// Explicit total; `None` sums the items.
    pub total_cents: Option<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    /// Creation timestamp; `None` stamps the insert time.
    pub created_at: Option<DateTime<Utc>>,
    pub priority: Option<String>,
    pub special_instructions: Option<String>,
}

/// Payload for one line item of a [`NewOrder`].
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub customizations: Vec<String>,
    pub note: Option<String>,
}

impl NewOrder {
    /// An empty pending order for the given customer.
    pub fn for_customer(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            status: None,
            items: Vec::new(),
            total_cents: None,
            customer_name: name.into(),
            customer_phone: phone.into(),
            customer_email: None,
            created_at: None,
            priority: None,
            special_instructions: None,
        }
    }

    pub fn with_item(mut self, name: impl Into<String>, quantity: u32, unit_price_cents: i64) -> Self {
        self.items.push(NewOrderItem {
            name: name.into(),
            quantity,
            unit_price_cents,
            customizations: Vec::new(),
            note: None,
        });
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_instructions(mut self, text: impl Into<String>) -> Self {
        self.special_instructions = Some(text.into());
        self
    }

    pub(crate) fn into_record(self, id: OrderId, display_number: u32, now: DateTime<Utc>) -> OrderRecord {
        let items: Vec<OrderItemRecord> = self
            .items
            .into_iter()
            .map(|item| OrderItemRecord {
                name: item.name,
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                customizations: item.customizations,
                note: item.note,
            })
            .collect();
        let total_cents = self.total_cents.unwrap_or_else(|| {
            items
                .iter()
                .map(|item| item.unit_price_cents * i64::from(item.quantity))
                .sum()
        });

        OrderRecord {
            id,
            display_number,
            status: self.status.unwrap_or_else(|| "pending".to_string()),
            items,
            total_cents,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
            created_at: self.created_at.unwrap_or(now),
            priority: self.priority,
            special_instructions: self.special_instructions,
            revision: 1,
        }
    }
}

impl OrderRecord {
    /// Status comparison the way the store's status column collates: case is
    /// ignored, padding trimmed, and `-` or ` ` compare equal to `_`.
    pub fn status_is_any(&self, spellings: &[String]) -> bool {
        let current = collate(&self.status);
        spellings.iter().any(|s| collate(s) == current)
    }
}

/// Folds a status string to the key the status column compares on.
pub fn collate(status: &str) -> String {
    status
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_record_sums_items_when_total_missing() {
        let record = NewOrder::for_customer("Alice", "555-0100")
            .with_item("Burger", 2, 850)
            .with_item("Fries", 1, 300)
            .into_record(OrderId::new(), 7, Utc::now());

        assert_eq!(record.total_cents, 2000);
        assert_eq!(record.status, "pending");
        assert_eq!(record.display_number, 7);
        assert_eq!(record.revision, 1);
    }

    #[test]
    fn test_status_comparison_ignores_case_and_padding() {
        let record = NewOrder::for_customer("Bob", "555-0101")
            .with_status(" Confirmed ")
            .into_record(OrderId::new(), 1, Utc::now());

        assert!(record.status_is_any(&["pending".into(), "confirmed".into()]));
        assert!(!record.status_is_any(&["preparing".into()]));

        let hyphenated = NewOrder::for_customer("Bob", "555-0101")
            .with_status("In-Progress")
            .into_record(OrderId::new(), 2, Utc::now());
        assert!(hyphenated.status_is_any(&["in_progress".into()]));
    }
}
