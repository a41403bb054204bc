//! Runtime configuration for builds and background checks.
//!
//! Project-specific settings (configurations, build files, destination) live
//! in the project file. This module only covers the process-level knobs that
//! tune timing, read from `SBUILD_*` environment variables.

use std::time::Duration;

use thiserror::Error;

pub const ENV_CHECK_DEBOUNCE_MS: &str = "SBUILD_CHECK_DEBOUNCE_MS";
pub const ENV_WRITE_RETRY_MS: &str = "SBUILD_WRITE_RETRY_MS";
pub const ENV_LOADER_DELAY_MS: &str = "SBUILD_LOADER_DELAY_MS";

const DEFAULT_CHECK_DEBOUNCE_MS: u64 = 100;
const DEFAULT_WRITE_RETRY_MS: u64 = 10;
const DEFAULT_LOADER_DELAY_MS: u64 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("invalid value for {key}: '{value}' is not a number of milliseconds")]
  InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
  /// Idle window before background check results are published.
  pub check_debounce: Duration,

  /// Delay before the single retry of a failed file write.
  pub write_retry_delay: Duration,

  /// Pause after raising the OUTPUT loading flag.
  pub loader_delay: Duration,
}

impl Default for StudioConfig {
  fn default() -> Self {
    Self {
      check_debounce: Duration::from_millis(DEFAULT_CHECK_DEBOUNCE_MS),
      write_retry_delay: Duration::from_millis(DEFAULT_WRITE_RETRY_MS),
      loader_delay: Duration::from_millis(DEFAULT_LOADER_DELAY_MS),
    }
  }
}

impl StudioConfig {
  /// Load configuration from environment variables, falling back to defaults.
  pub fn from_env() -> Result<Self, ConfigError> {
    Ok(Self {
      check_debounce: duration_from_env(ENV_CHECK_DEBOUNCE_MS, DEFAULT_CHECK_DEBOUNCE_MS)?,
      write_retry_delay: duration_from_env(ENV_WRITE_RETRY_MS, DEFAULT_WRITE_RETRY_MS)?,
      loader_delay: duration_from_env(ENV_LOADER_DELAY_MS, DEFAULT_LOADER_DELAY_MS)?,
    })
  }
}

fn duration_from_env(key: &str, default_ms: u64) -> Result<Duration, ConfigError> {
  match std::env::var(key) {
    Ok(value) => value
      .trim()
      .parse::<u64>()
      .map(Duration::from_millis)
      .map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
      }),
    Err(_) => Ok(Duration::from_millis(default_ms)),
  }
}
