//! # Store Messages
//!
//! The request enum sent from [`StoreClient`](crate::StoreClient) to
//! [`StoreActor`](crate::StoreActor), and the events the actor publishes.

use crate::error::StoreError;
use crate::record::{NewOrder, OrderId, OrderRecord};
use tokio::sync::{broadcast, oneshot};

/// One-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Requests understood by the store actor.
///
/// The first four variants are the query/command surface the engine relies on.
/// `Subscribe` opens the change feed. `ForceStatus` and `DropSubscribers` exist for
/// back-office writers and outage drills.
#[derive(Debug)]
pub enum StoreRequest {
    Insert {
        order: NewOrder,
        respond_to: Response<OrderRecord>,
    },
    Get {
        id: OrderId,
        respond_to: Response<Option<OrderRecord>>,
    },
    /// Rows whose status matches none of `exclude_statuses`, oldest first.
    List {
        exclude_statuses: Vec<String>,
        respond_to: Response<Vec<OrderRecord>>,
    },
    /// Compare-and-swap on the status column.
    UpdateStatus {
        id: OrderId,
        expected: Vec<String>,
        new_status: String,
        respond_to: Response<UpdateOutcome>,
    },
    /// Unconditional status write.
    ForceStatus {
        id: OrderId,
        status: String,
        respond_to: Response<Option<OrderRecord>>,
    },
    Subscribe {
        respond_to: Response<broadcast::Receiver<ChangeEvent>>,
    },
    /// Disconnects every current subscriber.
    DropSubscribers { respond_to: Response<()> },
}

/// Result of a conditional status update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The write happened; carries the row after the write.
    Updated(OrderRecord),
    /// The row exists but its status was not one of the expected spellings.
    Conflict { current: String },
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
}

/// A row change published on the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: OrderRecord,
}
