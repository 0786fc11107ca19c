//! Logging setup.
//!
//! Verbosity comes from `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run      # lifecycle, transitions, alerts
//! RUST_LOG=debug cargo run     # plus dedupe decisions and store payloads
//! ```
//!
//! Session logs carry a `terminal` field, so two terminals in the same process can be
//! told apart.

/// Installs the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
