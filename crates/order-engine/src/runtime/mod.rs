//! Runtime wiring: starting the store, opening terminal sessions, shutting down, and
//! tracing setup.

pub mod kitchen;
pub mod tracing;

pub use kitchen::{Kitchen, ShutdownError};
pub use self::tracing::setup_tracing;
