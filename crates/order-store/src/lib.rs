//! # Order Store
//!
//! An actor-backed, in-memory stand-in for the restaurant's system of record.
//!
//! The order engine treats the store as an external collaborator: something that
//! can list open orders, fetch a single order, apply a *conditional* status update
//! and push change notifications. This crate provides exactly that surface, built
//! the same way every other resource in the system is built:
//!
//! 1. **Records** ([`OrderRecord`]) - the loosely-typed rows, statuses are plain strings
//! 2. **Runtime** ([`StoreActor`]) - owns the rows and processes requests sequentially
//! 3. **Interface** ([`StoreClient`]) - a cheap, cloneable handle that talks to the actor
//!
//! ## Conditional updates
//!
//! [`StoreClient::update_status`] is a compare-and-swap: the write only happens if the
//! row's current status is one of the caller's expected spellings. Because the actor
//! processes one request at a time, two terminals racing to move the same order can
//! never both win.
//!
//! ## Change feed
//!
//! Every successful write bumps the row's `revision` and is published on a
//! `tokio::sync::broadcast` channel. Subscribers that fall behind observe
//! `RecvError::Lagged`, and [`StoreClient::drop_subscribers`] disconnects everyone to
//! simulate an outage. In both cases events are **not** redelivered, so consumers
//! must reconcile by re-reading.
//!
//! ```rust
//! use order_store::{NewOrder, StoreActor, UpdateOutcome};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = StoreActor::new(32, 64);
//!     tokio::spawn(actor.run());
//!
//!     let record = client.insert(NewOrder::for_customer("Alice", "555-0100")).await.unwrap();
//!     let outcome = client
//!         .update_status(record.id, vec!["pending".into()], "preparing")
//!         .await
//!         .unwrap();
//!     assert!(matches!(outcome, UpdateOutcome::Updated(_)));
//! }
//! ```

pub mod actor;
pub mod client;
pub mod error;
pub mod message;
pub mod mock;
pub mod record;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use error::StoreError;
pub use message::{ChangeEvent, ChangeKind, Response, StoreRequest, UpdateOutcome};
pub use record::{collate, NewOrder, NewOrderItem, OrderId, OrderItemRecord, OrderRecord};
