//! # Store Actor
//!
//! The server half of the store. It owns every row and the feed's broadcast sender,
//! and handles one [`StoreRequest`] at a time, which is what makes
//! [`StoreRequest::UpdateStatus`] linearizable per row without any locking.

use crate::client::StoreClient;
use crate::message::{ChangeEvent, ChangeKind, StoreRequest, UpdateOutcome};
use crate::record::{OrderId, OrderRecord};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// In-memory order store.
///
/// # Usage Pattern
///
/// 1. **Create**: `StoreActor::new()` returns the actor and its [`StoreClient`].
/// 2. **Run**: spawn `actor.run()` on the runtime.
/// 3. **Use**: clone the client freely; dropping every clone stops the actor.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    rows: HashMap<OrderId, OrderRecord>,
    next_display_number: u32,
    feed: broadcast::Sender<ChangeEvent>,
    feed_capacity: usize,
}

impl StoreActor {
    /// Creates the actor and its client.
    ///
    /// * `buffer_size` - request channel capacity; callers wait when it is full.
    /// * `feed_capacity` - events a subscriber may fall behind before it lags.
    pub fn new(buffer_size: usize, feed_capacity: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let feed_capacity = feed_capacity.max(1);
        let (feed, _) = broadcast::channel(feed_capacity);
        let actor = Self {
            receiver,
            rows: HashMap::new(),
            next_display_number: 1,
            feed,
            feed_capacity,
        };
        (actor, StoreClient::new(sender))
    }

    /// Processes requests until every client has been dropped.
    pub async fn run(mut self) {
        info!("Store actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Insert { order, respond_to } => {
                    debug!(?order, "Insert");
                    let id = OrderId::new();
                    let record = order.into_record(id, self.next_display_number, Utc::now());
                    self.next_display_number += 1;
                    self.rows.insert(id, record.clone());
                    info!(order_id = %id, display_number = record.display_number, size = self.rows.len(), "Inserted");
                    self.publish(ChangeKind::Insert, &record);
                    let _ = respond_to.send(Ok(record));
                }
                StoreRequest::Get { id, respond_to } => {
                    let row = self.rows.get(&id).cloned();
                    debug!(order_id = %id, found = row.is_some(), "Get");
                    let _ = respond_to.send(Ok(row));
                }
                StoreRequest::List {
                    exclude_statuses,
                    respond_to,
                } => {
                    let mut rows: Vec<OrderRecord> = self
                        .rows
                        .values()
                        .filter(|row| !row.status_is_any(&exclude_statuses))
                        .cloned()
                        .collect();
                    rows.sort_by_key(|row| (row.created_at, row.display_number));
                    debug!(count = rows.len(), "List");
                    let _ = respond_to.send(Ok(rows));
                }
                StoreRequest::UpdateStatus {
                    id,
                    expected,
                    new_status,
                    respond_to,
                } => {
                    let outcome = self.update_status(id, &expected, new_status);
                    let _ = respond_to.send(Ok(outcome));
                }
                StoreRequest::ForceStatus {
                    id,
                    status,
                    respond_to,
                } => {
                    let updated = self.write_status(id, status);
                    let _ = respond_to.send(Ok(updated));
                }
                StoreRequest::Subscribe { respond_to } => {
                    debug!(subscribers = self.feed.receiver_count() + 1, "Subscribe");
                    let _ = respond_to.send(Ok(self.feed.subscribe()));
                }
                StoreRequest::DropSubscribers { respond_to } => {
                    warn!(subscribers = self.feed.receiver_count(), "Dropping feed subscribers");
                    // Replacing the sender closes every receiver of the old one.
                    let (feed, _) = broadcast::channel(self.feed_capacity);
                    self.feed = feed;
                    let _ = respond_to.send(Ok(()));
                }
            }
        }

        info!(size = self.rows.len(), "Store actor shutdown");
    }

    fn update_status(&mut self, id: OrderId, expected: &[String], new_status: String) -> UpdateOutcome {
        let Some(row) = self.rows.get(&id) else {
            warn!(order_id = %id, "Conditional update on unknown order");
            return UpdateOutcome::NotFound;
        };
        if !row.status_is_any(expected) {
            warn!(order_id = %id, current = %row.status, ?expected, "Conditional update conflict");
            return UpdateOutcome::Conflict {
                current: row.status.clone(),
            };
        }
        match self.write_status(id, new_status) {
            Some(record) => UpdateOutcome::Updated(record),
            None => UpdateOutcome::NotFound,
        }
    }

    fn write_status(&mut self, id: OrderId, status: String) -> Option<OrderRecord> {
        let row = self.rows.get_mut(&id)?;
        row.status = status;
        row.revision += 1;
        let record = row.clone();
        info!(order_id = %id, status = %record.status, revision = record.revision, "Status written");
        self.publish(ChangeKind::Update, &record);
        Some(record)
    }

    fn publish(&self, kind: ChangeKind, record: &OrderRecord) {
        let event = ChangeEvent {
            kind,
            record: record.clone(),
        };
        if self.feed.send(event).is_err() {
            debug!(order_id = %record.id, "No feed subscribers");
        }
    }
}
