//! Canonical order status and priority.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;

/// The five canonical order states.
///
/// ```text
/// pending ──► preparing ──► ready ──► completed
///    │            │
///    └────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Targets reachable in one step.
    pub fn allowed_targets(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::Ready, OrderStatus::Cancelled],
            OrderStatus::Ready => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn is_open(self) -> bool {
        !self.is_terminal()
    }

    /// Every raw spelling the store may hold for this status, canonical first.
    ///
    /// Used both to normalize incoming rows and to build the expected-status set
    /// of a conditional update.
    pub fn spellings(self) -> &'static [&'static str] {
        match self {
            OrderStatus::Pending => &["pending", "confirmed", "new", "received", "placed"],
            OrderStatus::Preparing => &["preparing", "accepted", "in_progress", "cooking"],
            OrderStatus::Ready => &["ready", "ready_for_pickup"],
            OrderStatus::Completed => &["completed", "done", "picked_up", "delivered", "fulfilled"],
            OrderStatus::Cancelled => &["cancelled", "canceled", "rejected", "void"],
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Informational priority. Changes alert emphasis only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Express,
    Vip,
}

impl Priority {
    /// Lenient parse; anything unrecognized is `Normal`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("express") | Some("rush") => Priority::Express,
            Some("vip") => Priority::Vip,
            Some("normal") | Some("") | None => Priority::Normal,
            Some(other) => {
                debug!(priority = other, "Unknown priority, using normal");
                Priority::Normal
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::Express => "express",
            Priority::Vip => "vip",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
