//! # Domain Model
//!
//! Strongly-typed order data used throughout the engine. Raw store rows are turned
//! into these types by the [`projection`](crate::projection) module; nothing else
//! reads the loosely-typed records.

pub mod money;
pub mod order;
pub mod status;

pub use money::*;
pub use order::*;
pub use status::*;
