//! # Lifecycle Controller
//!
//! The only way a terminal changes an order's status.
//!
//! A request is first checked against the transition graph using the session's
//! latest copy of the order. Illegal requests fail with
//! [`TransitionError::InvalidTransition`] before anything is sent. Legal requests go
//! to the store as a conditional update keyed on the expected current status, so
//! when two terminals race on the same order exactly one wins and the other gets
//! [`TransitionError::StaleState`].
//!
//! Every store round trip is bounded by `timeout`. A timeout is reported as
//! [`TransitionError::Timeout`]; the write may or may not have happened, so the
//! caller re-reads before retrying.

pub mod error;

pub use error::TransitionError;

use crate::model::{Order, OrderStatus};
use crate::ports::OrderStore;
use crate::projection::project;
use order_store::UpdateOutcome;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A transition the store accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionReceipt {
    /// The order as written by the store.
    pub order: Order,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl TransitionReceipt {
    /// `preparing → ready` plays the ready alert.
    pub fn announces_ready(&self) -> bool {
        self.from == OrderStatus::Preparing && self.to == OrderStatus::Ready
    }
}

#[derive(Clone)]
pub struct LifecycleController {
    store: Arc<dyn OrderStore>,
    timeout: Duration,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn OrderStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// The synchronous precondition check. Performs no I/O.
    pub fn check(order: &Order, target: OrderStatus) -> Result<(), TransitionError> {
        if order.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                order_id: order.id,
                from: order.status,
                to: target,
            })
        }
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, from = %order.status, to = %target))]
    pub async fn request_transition(
        &self,
        order: &Order,
        target: OrderStatus,
    ) -> Result<TransitionReceipt, TransitionError> {
        Self::check(order, target)?;

        let from = order.status;
        let update = self.store.update_status(order.id, from, target);
        let outcome = match tokio::time::timeout(self.timeout, update).await {
            Ok(result) => result.map_err(|e| TransitionError::Store(e.to_string()))?,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Conditional update timed out");
                return Err(TransitionError::Timeout {
                    order_id: order.id,
                    timeout: self.timeout,
                });
            }
        };

        match outcome {
            UpdateOutcome::Updated(record) => {
                let projected = project(&record);
                info!(revision = record.revision, "Transition applied");
                Ok(TransitionReceipt {
                    order: projected.order,
                    from,
                    to: target,
                })
            }
            UpdateOutcome::Conflict { current } => {
                debug!(%current, "Lost conditional update");
                Err(TransitionError::StaleState {
                    order_id: order.id,
                    expected: from,
                    current,
                })
            }
            UpdateOutcome::NotFound => Err(TransitionError::NotFound(order.id)),
        }
    }
}
