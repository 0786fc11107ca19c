use crate::controller::{TransitionError, TransitionReceipt};
use crate::model::{DisplayNumber, OrderId, OrderStatus, OrderView};
use crate::ports::{FeedError, FeedMessage, PrintError, StoreUnavailable};
use crate::projection::OrderFilter;
use order_store::OrderRecord;
use tokio::sync::{mpsc, oneshot};

pub type TransitionResponse = oneshot::Sender<Result<TransitionReceipt, TransitionError>>;

/// Operator requests handled by the session loop.
#[derive(Debug)]
pub enum SessionRequest {
    Transition {
        id: OrderId,
        target: OrderStatus,
        respond_to: TransitionResponse,
    },
    Snapshot {
        filter: OrderFilter,
        respond_to: oneshot::Sender<Vec<OrderView>>,
    },
}

/// Non-fatal conditions surfaced to the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionWarning {
    /// A store row carried a status string outside the known set; shown as `pending`.
    UnrecognizedStatus { order_id: OrderId, raw_status: String },
    /// The ticket was not printed. Alerts for the order were not affected.
    PrintFailed {
        order_id: OrderId,
        display_number: DisplayNumber,
        error: PrintError,
    },
    FeedDisconnected,
    /// The feed is back and the open-order set was re-read from the store.
    FeedResumed { reconciled: usize },
    ReconcileFailed { error: String },
}

/// Orders that left the store's open set since the session last looked.
pub(crate) struct Reconciliation {
    pub open: Vec<OrderRecord>,
    /// `None` when the store no longer has the row.
    pub departed: Vec<(OrderId, Option<OrderRecord>)>,
}

/// Results of work the loop handed to spawned tasks.
pub(crate) enum Completion {
    TransitionSettled {
        id: OrderId,
        result: Result<TransitionReceipt, TransitionError>,
        respond_to: TransitionResponse,
    },
    Reconciled(Result<Reconciliation, StoreUnavailable>),
    Refreshed {
        id: OrderId,
        result: Result<Option<OrderRecord>, StoreUnavailable>,
    },
    Subscribed(Result<mpsc::Receiver<FeedMessage>, FeedError>),
    Printed {
        order_id: OrderId,
        display_number: DisplayNumber,
        result: Result<(), PrintError>,
    },
}
