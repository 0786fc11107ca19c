use super::{Money, OrderStatus, Priority};
use chrono::{DateTime, Utc};
pub use order_store::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;

/// Human-facing, store-assigned sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayNumber(pub u32);

impl Display for DisplayNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub customizations: Vec<String>,
    pub note: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// The engine's view of an order.
///
/// Only [`status`](Order::status) and [`revision`](Order::revision) change over an
/// order's life; everything else is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub display_number: DisplayNumber,
    pub status: OrderStatus,
    pub items: Vec<LineItem>,
    pub total: Money,
    pub customer: Customer,
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
    pub special_instructions: Option<String>,
    /// Store row version; higher is newer.
    pub revision: u64,
}

impl Order {
    /// Time since creation. Clock skew that puts `created_at` in the future counts as zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created_at).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// An order as presented to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub order: Order,
    pub is_late: bool,
    #[serde(with = "humantime_serde")]
    pub age: Duration,
}
