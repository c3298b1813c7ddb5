//! Engine configuration.
//!
//! Loadable from TOML:
//!
//! ```toml
//! durability = "strict"
//! max_append_retries = 8
//! default_author = "crm"
//! append_timeout_ms = 2000
//! lock_wait_ms = 5000
//! ```
//!
//! Batched durability is a table:
//!
//! ```toml
//! [durability.batched]
//! interval_ms = 100
//! batch_size = 64
//! ```

use crate::error::{Error, Result};
use crate::types::{DurabilityMode, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// WAL durability mode (default: batched, 100ms / 64 commits)
    pub durability: DurabilityMode,
    /// Commit attempts per append before `ConcurrentModification` (default: 5)
    pub max_append_retries: u32,
    /// Backoff ceiling after the first conflict, in ms (default: 1)
    pub retry_backoff_base_ms: u64,
    /// Backoff ceiling for any single wait, in ms (default: 20)
    pub retry_backoff_max_ms: u64,
    /// Author recorded when a caller supplies none (default: "system")
    pub default_author: String,
    /// Caller deadline for an append, in ms (default: none)
    pub append_timeout_ms: Option<u64>,
    /// How long open waits for another process to release the data
    /// directory, in ms (default: 0, fail at once)
    pub lock_wait_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            durability: DurabilityMode::default(),
            max_append_retries: 5,
            retry_backoff_base_ms: 1,
            retry_backoff_max_ms: 20,
            default_author: annolog_concurrency::DEFAULT_AUTHOR.to_string(),
            append_timeout_ms: None,
            lock_wait_ms: 0,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_append_retries == 0 {
            return Err(Error::Config("max_append_retries must be at least 1".into()));
        }
        if self.retry_backoff_max_ms < self.retry_backoff_base_ms {
            return Err(Error::Config(format!(
                "retry_backoff_max_ms ({}) is below retry_backoff_base_ms ({})",
                self.retry_backoff_max_ms, self.retry_backoff_base_ms
            )));
        }
        if self.default_author.trim().is_empty() {
            return Err(Error::Config("default_author must not be empty".into()));
        }
        if let DurabilityMode::Batched { batch_size: 0, .. } = self.durability {
            return Err(Error::Config("batched durability needs batch_size >= 1".into()));
        }
        Ok(())
    }

    /// Retry policy for the append coordinator
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_append_retries,
            backoff_base: Duration::from_millis(self.retry_backoff_base_ms),
            backoff_max: Duration::from_millis(self.retry_backoff_max_ms),
            timeout: self.append_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Wait allowed for the data directory lock on open
    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }
}
