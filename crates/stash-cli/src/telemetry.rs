//! Telemetry initialisation for the stash CLI.
//!
//! Lightweight setup: human-readable logs to stderr only, so stdout stays
//! clean for the token or the decrypted secret.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the tracing subscriber.
///
/// Log level comes from `RUST_LOG` when set, falling back to the configured
/// level (default `warn`).
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}
