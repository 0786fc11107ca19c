//! # Store Errors
//!
//! Transport-level failures talking to the store actor. Business outcomes such as a
//! lost compare-and-swap are not errors; they are reported through
//! [`UpdateOutcome`](crate::UpdateOutcome).

/// Errors returned by [`StoreClient`](crate::StoreClient).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Store actor closed")]
    ActorClosed,
    #[error("Store actor dropped response channel")]
    ActorDropped,
}
