//! Configuration loading and validation for the stash CLI.
//!
//! All values are read from `STASH_`-prefixed environment variables at
//! startup. The process exits with a clear error message if a required
//! variable is missing or invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use stash_client::RetryPolicy;

/// Validated CLI configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the stash backend (`STASH_API_URL`). **Required.**
    pub api_url: String,

    /// Retries beyond the first attempt for each backend call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base in milliseconds; delay before retry `n` is `base * 2^n`
    /// plus jitter.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Stdin idle timeout in seconds, reset on every chunk received.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Tracing log level (e.g. `"warn"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_idle_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be
    /// parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("STASH"))
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration (is STASH_API_URL set?)")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first
    /// failure.
    fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            anyhow::bail!("STASH_API_URL is required and must not be empty");
        }
        let url = self.api_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("STASH_API_URL must start with http:// or https://");
        }
        if self.base_delay_ms == 0 {
            anyhow::bail!("STASH_BASE_DELAY_MS must be > 0");
        }
        if self.idle_timeout_secs == 0 {
            anyhow::bail!("STASH_IDLE_TIMEOUT_SECS must be > 0");
        }
        Ok(())
    }

    /// Retry tuning for the request layer.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }

    /// Stdin idle timeout as a [`Duration`].
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
