use super::message::SessionRequest;
use crate::controller::{TransitionError, TransitionReceipt};
use crate::model::{OrderId, OrderStatus, OrderView};
use crate::projection::OrderFilter;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("session closed")]
    Closed,
}

/// Proof that an operator confirmed rejecting an order.
///
/// Rejection cannot be undone, so [`SessionHandle::reject`] only accepts this token
/// and the dashboard builds it after its confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectConfirmation {
    order_id: OrderId,
}

impl RejectConfirmation {
    pub fn confirm(order_id: OrderId) -> Self {
        Self { order_id }
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }
}

/// Cloneable entry point into one terminal's session.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionRequest>,
}

impl SessionHandle {
    pub(crate) fn new(sender: mpsc::Sender<SessionRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self))]
    pub async fn request_transition(
        &self,
        id: OrderId,
        target: OrderStatus,
    ) -> Result<TransitionReceipt, TransitionError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SessionRequest::Transition {
                id,
                target,
                respond_to,
            })
            .await
            .map_err(|_| TransitionError::SessionClosed)?;
        let result = response.await.map_err(|_| TransitionError::SessionClosed)?;
        debug!(ok = result.is_ok(), "Transition answered");
        result
    }

    pub async fn accept(&self, id: OrderId) -> Result<TransitionReceipt, TransitionError> {
        self.request_transition(id, OrderStatus::Preparing).await
    }

    pub async fn reject(
        &self,
        confirmation: RejectConfirmation,
    ) -> Result<TransitionReceipt, TransitionError> {
        self.request_transition(confirmation.order_id(), OrderStatus::Cancelled)
            .await
    }

    pub async fn mark_ready(&self, id: OrderId) -> Result<TransitionReceipt, TransitionError> {
        self.request_transition(id, OrderStatus::Ready).await
    }

    pub async fn complete(&self, id: OrderId) -> Result<TransitionReceipt, TransitionError> {
        self.request_transition(id, OrderStatus::Completed).await
    }

    /// Every order the session holds, oldest first, with lateness computed now.
    pub async fn snapshot(&self) -> Result<Vec<OrderView>, SessionError> {
        self.orders(OrderFilter::All).await
    }

    pub async fn orders(&self, filter: OrderFilter) -> Result<Vec<OrderView>, SessionError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SessionRequest::Snapshot { filter, respond_to })
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }
}
