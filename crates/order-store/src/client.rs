//! # Store Client
//!
//! Cloneable, async handle for a [`StoreActor`](crate::StoreActor).

use crate::error::StoreError;
use crate::message::{ChangeEvent, StoreRequest, UpdateOutcome};
use crate::record::{NewOrder, OrderId, OrderRecord};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::instrument;

/// A type-safe client for the store actor. Holds only a sender, so cloning is cheap.
#[derive(Clone, Debug)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::ActorClosed)?;
        response.await.map_err(|_| StoreError::ActorDropped)?
    }

    #[instrument(skip(self, order), fields(customer = %order.customer_name))]
    pub async fn insert(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        self.call(|respond_to| StoreRequest::Insert { order, respond_to }).await
    }

    pub async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>, StoreError> {
        self.call(|respond_to| StoreRequest::Get { id, respond_to }).await
    }

    /// Lists rows whose status matches none of `exclude_statuses`.
    pub async fn list(&self, exclude_statuses: Vec<String>) -> Result<Vec<OrderRecord>, StoreError> {
        self.call(|respond_to| StoreRequest::List {
            exclude_statuses,
            respond_to,
        })
        .await
    }

    /// Writes `new_status` only if the current status is one of `expected`.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        expected: Vec<String>,
        new_status: impl Into<String> + std::fmt::Debug,
    ) -> Result<UpdateOutcome, StoreError> {
        let new_status = new_status.into();
        self.call(|respond_to| StoreRequest::UpdateStatus {
            id,
            expected,
            new_status,
            respond_to,
        })
        .await
    }

    /// Writes a status without any precondition.
    #[instrument(skip(self))]
    pub async fn force_status(
        &self,
        id: OrderId,
        status: impl Into<String> + std::fmt::Debug,
    ) -> Result<Option<OrderRecord>, StoreError> {
        let status = status.into();
        self.call(|respond_to| StoreRequest::ForceStatus {
            id,
            status,
            respond_to,
        })
        .await
    }

    pub async fn subscribe(&self) -> Result<broadcast::Receiver<ChangeEvent>, StoreError> {
        self.call(|respond_to| StoreRequest::Subscribe { respond_to }).await
    }

    pub async fn drop_subscribers(&self) -> Result<(), StoreError> {
        self.call(|respond_to| StoreRequest::DropSubscribers { respond_to })
            .await
    }
}
