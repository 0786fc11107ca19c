//! # Order Engine
//!
//! The core of a restaurant order dashboard: it keeps each terminal's view of open
//! orders current, moves orders through their lifecycle safely when several terminals
//! act at once, and raises new-order and ready alerts exactly once per order.
//!
//! ## Components
//!
//! - **[projection]**: Store rows to typed [`Order`](model::Order)s, including legacy status names
//! - **[controller]**: The transition graph and conditional updates against the store
//! - **[dispatcher]**: Deduplicated alerts, toasts and kitchen ticket prints
//! - **[staleness]**: Late flags for orders still waiting to be accepted
//! - **[session]**: One single-consumer loop per terminal tying the above together
//! - **[ports]**: Traits for the store, change feed, printer and alert sink
//! - **[runtime]**: Wiring a store and several sessions, plus tracing setup
//!
//! ## Lifecycle
//!
//! ```text
//! pending ──► preparing ──► ready ──► completed
//!    │            │
//!    └────────────┴──► cancelled
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use order_engine::config::EngineConfig;
//! use order_engine::ports::{LogTicketPrinter, TracingAlertSink};
//! use order_engine::runtime::Kitchen;
//! use order_store::NewOrder;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut kitchen = Kitchen::start(EngineConfig::default())?;
//!     let (front, _warnings) = kitchen.open_session(
//!         "front",
//!         Arc::new(TracingAlertSink::new("front")),
//!         Arc::new(LogTicketPrinter),
//!     );
//!
//!     let order = kitchen
//!         .store()
//!         .insert(NewOrder::for_customer("Alice", "555-0100").with_item("Burger", 1, 1250))
//!         .await?;
//!     // Once the session has seen the order:
//!     front.accept(order.id).await?;
//!
//!     drop(front);
//!     kitchen.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod model;
pub mod ports;
pub mod projection;
pub mod runtime;
pub mod session;
pub mod staleness;
