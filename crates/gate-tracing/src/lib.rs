//! Tracing subscriber setup for the admin gateway.
//!
//! Kept as its own crate so the subscriber stack (fmt layer + `EnvFilter`)
//! is initialized the same way by every binary that links it.

mod config;
mod spans;

pub use config::{LogFormat, TracingConfig};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Logs go to stderr. The filter comes from `config.log_level` (same syntax
/// as `RUST_LOG`, e.g. `"info"` or `"admin_gate=debug,info"`); an invalid
/// directive falls back to `info` rather than failing startup.
///
/// Must be called exactly once, before any other subsystem logs.
pub fn init_tracing(config: &TracingConfig) {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init(),
    }

    tracing::debug!(
        log_level = %config.log_level,
        format = ?config.format,
        "tracing initialized"
    );
}
