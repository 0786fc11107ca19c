//! # Collaborator Ports
//!
//! The seams between the engine and the world around it. The engine only ever talks
//! to these traits; [`store_adapter`] wires them to the in-memory
//! [`order_store`] actor and [`console`] provides log-backed alert and print sinks
//! for the demo binary.
//!
//! | Port | Direction | Delivery |
//! |------|-----------|----------|
//! | [`OrderStore`] | query + conditional write | awaited, bounded by a timeout |
//! | [`ChangeFeed`] | push | at-least-once, unordered across orders |
//! | [`TicketPrinter`] | command | best-effort, never retried |
//! | [`AlertSink`] | command | fire-and-forget |

pub mod console;
pub mod store_adapter;

pub use console::{LogTicketPrinter, TracingAlertSink};
pub use store_adapter::StoreFeed;

use crate::dispatcher::{Alert, KitchenTicket, Toast};
use crate::model::{OrderId, OrderStatus};
use async_trait::async_trait;
use order_store::{OrderRecord, StoreError, UpdateOutcome};
use tokio::sync::mpsc;

/// The store could not be reached or did not answer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("order store unavailable: {0}")]
pub struct StoreUnavailable(pub String);

impl From<StoreError> for StoreUnavailable {
    fn from(e: StoreError) -> Self {
        StoreUnavailable(e.to_string())
    }
}

/// Query and conditional-update access to the system of record.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Every order that is not completed or cancelled, with its items.
    async fn open_orders(&self) -> Result<Vec<OrderRecord>, StoreUnavailable>;

    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderRecord>, StoreUnavailable>;

    /// Compare-and-swap: writes `new` only if the row is still `expected`.
    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<UpdateOutcome, StoreUnavailable>;
}

/// One delivery from the change feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    Change(OrderRecord),
    /// The connection dropped; events may be lost until `Resumed`.
    Disconnected,
    /// The connection is back. Events from the gap are not redelivered.
    Resumed,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("change feed subscription failed: {0}")]
    Subscribe(String),
}

/// Push subscription to order changes.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self) -> Result<mpsc::Receiver<FeedMessage>, FeedError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrintError {
    #[error("printer unreachable: {0}")]
    Unreachable(String),
    #[error("printer rejected ticket: {0}")]
    Rejected(String),
}

/// Kitchen ticket printing.
#[async_trait]
pub trait TicketPrinter: Send + Sync {
    async fn print(&self, ticket: KitchenTicket) -> Result<(), PrintError>;
}

/// Audible alerts and on-screen toasts. Calls must return promptly.
pub trait AlertSink: Send + Sync {
    fn play_alert(&self, alert: &Alert);
    fn show_toast(&self, toast: &Toast);
}
