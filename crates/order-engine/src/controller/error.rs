//! Error types for status transitions.

use crate::model::{OrderId, OrderStatus};
use std::time::Duration;
use thiserror::Error;

/// Why a transition request did not take effect.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransitionError {
    /// The target is not reachable from the current status. No write was attempted.
    #[error("order {order_id}: cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The store's row no longer held the expected status.
    #[error("order {order_id}: expected {expected}, store holds {current:?}")]
    StaleState {
        order_id: OrderId,
        expected: OrderStatus,
        current: String,
    },

    /// The conditional update did not answer in time. The outcome is unknown.
    #[error("order {order_id}: no answer from store within {timeout:?}")]
    Timeout { order_id: OrderId, timeout: Duration },

    /// The store holds a status this engine cannot read. A conditional update
    /// against it can never match, so nothing was sent.
    #[error("order {order_id}: store status {raw_status:?} is not recognized")]
    UnrecognizedStatus { order_id: OrderId, raw_status: String },

    /// The session has never seen this order.
    #[error("order {0} is not known to this session")]
    UnknownOrder(OrderId),

    /// The store has no row for this order.
    #[error("order {0} not found in store")]
    NotFound(OrderId),

    #[error("order store error: {0}")]
    Store(String),

    #[error("session closed")]
    SessionClosed,
}

impl TransitionError {
    /// Whether the caller must re-read the order before trying again.
    pub fn requires_reread(&self) -> bool {
        matches!(
            self,
            TransitionError::StaleState { .. }
                | TransitionError::Timeout { .. }
                | TransitionError::NotFound(_)
                | TransitionError::Store(_)
        )
    }

    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            TransitionError::InvalidTransition { order_id, .. }
            | TransitionError::StaleState { order_id, .. }
            | TransitionError::Timeout { order_id, .. }
            | TransitionError::UnrecognizedStatus { order_id, .. } => Some(*order_id),
            TransitionError::UnknownOrder(id) | TransitionError::NotFound(id) => Some(*id),
            TransitionError::Store(_) | TransitionError::SessionClosed => None,
        }
    }
}
