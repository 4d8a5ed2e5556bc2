//! # Observability & Tracing
//!
//! Structured logging for the lifecycle engine via the `tracing` crate.
//! Configure levels with `RUST_LOG`; the engine logs the received event
//! at debug, the outcome transitions at info, and every masked delete
//! failure or suppressed delivery at error so operators can reconcile
//! leaked resources out-of-band.

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
