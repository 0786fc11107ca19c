//! Ports backed by the [`order_store`] actor.

use super::{ChangeFeed, FeedError, FeedMessage, OrderStore, StoreUnavailable};
use crate::model::{OrderId, OrderStatus};
use async_trait::async_trait;
use order_store::{ChangeEvent, OrderRecord, StoreClient, UpdateOutcome};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, instrument, warn};

fn spellings_of(statuses: &[OrderStatus]) -> Vec<String> {
    statuses
        .iter()
        .flat_map(|status| status.spellings().iter().map(|s| s.to_string()))
        .collect()
}

#[async_trait]
impl OrderStore for StoreClient {
    #[instrument(skip(self))]
    async fn open_orders(&self) -> Result<Vec<OrderRecord>, StoreUnavailable> {
        let terminal = spellings_of(&[OrderStatus::Completed, OrderStatus::Cancelled]);
        Ok(self.list(terminal).await?)
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<OrderRecord>, StoreUnavailable> {
        Ok(self.get(id).await?)
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<UpdateOutcome, StoreUnavailable> {
        debug!(order_id = %id, %expected, %new, "Conditional update");
        Ok(StoreClient::update_status(self, id, spellings_of(&[expected]), new.as_str()).await?)
    }
}

/// [`ChangeFeed`] over the store's broadcast channel.
///
/// Each subscription runs a forwarder task. A lagging receiver is reported as
/// `Disconnected` + `Resumed`; a closed one is re-opened after `reconnect_delay`.
#[derive(Clone)]
pub struct StoreFeed {
    client: StoreClient,
    reconnect_delay: Duration,
    capacity: usize,
}

impl StoreFeed {
    pub fn new(client: StoreClient, reconnect_delay: Duration, capacity: usize) -> Self {
        Self {
            client,
            reconnect_delay,
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl ChangeFeed for StoreFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<FeedMessage>, FeedError> {
        let events = self
            .client
            .subscribe()
            .await
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;
        let (tx, rx) = mpsc::channel(self.capacity);
        tokio::spawn(forward(self.client.clone(), events, tx, self.reconnect_delay));
        Ok(rx)
    }
}

async fn forward(
    client: StoreClient,
    mut events: broadcast::Receiver<ChangeEvent>,
    tx: mpsc::Sender<FeedMessage>,
    reconnect_delay: Duration,
) {
    loop {
        let received = tokio::select! {
            received = events.recv() => received,
            _ = tx.closed() => return,
        };

        match received {
            Ok(event) => {
                if tx.send(FeedMessage::Change(event.record)).await.is_err() {
                    return;
                }
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "Change feed lagged");
                if tx.send(FeedMessage::Disconnected).await.is_err()
                    || tx.send(FeedMessage::Resumed).await.is_err()
                {
                    return;
                }
            }
            Err(RecvError::Closed) => {
                warn!("Change feed closed");
                if tx.send(FeedMessage::Disconnected).await.is_err() {
                    return;
                }
                match resubscribe(&client, &tx, reconnect_delay).await {
                    Some(fresh) => events = fresh,
                    None => return,
                }
                info!("Change feed resumed");
                if tx.send(FeedMessage::Resumed).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// `None` once the store is gone or nobody is listening any more.
async fn resubscribe(
    client: &StoreClient,
    tx: &mpsc::Sender<FeedMessage>,
    reconnect_delay: Duration,
) -> Option<broadcast::Receiver<ChangeEvent>> {
    tokio::select! {
        _ = tokio::time::sleep(reconnect_delay) => {}
        _ = tx.closed() => return None,
    }
    match client.subscribe().await {
        Ok(events) => Some(events),
        Err(e) => {
            warn!(error = %e, "Change feed cannot reconnect");
            None
        }
    }
}
