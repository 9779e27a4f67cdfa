//! Retry policy for calls to CloudWatch Logs.

use serde::Serialize;

use super::{ConfigError, parse_or};

pub const MAX_RETRIES_VAR: &str = "MAX_RETRIES";
pub const RETRY_INITIAL_DELAY_MS_VAR: &str = "RETRY_INITIAL_DELAY_MS";
pub const RETRY_MAX_DELAY_MS_VAR: &str = "RETRY_MAX_DELAY_MS";

/// Exponential backoff settings.
#[derive(Debug, Clone, Serialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial request).
    /// Set to 0 to disable retries.
    /// Default: 3
    pub max_retries: u32,

    /// Initial delay before first retry in milliseconds.
    /// Default: 100
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds.
    /// Default: 10000
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,

    /// Random jitter added to delays (fraction, 0.0-1.0).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.1
}

impl RetryConfig {
    pub(super) fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            max_retries: parse_or(lookup, MAX_RETRIES_VAR, default_max_retries())?,
            initial_delay_ms: parse_or(
                lookup,
                RETRY_INITIAL_DELAY_MS_VAR,
                default_initial_delay_ms(),
            )?,
            max_delay_ms: parse_or(lookup, RETRY_MAX_DELAY_MS_VAR, default_max_delay_ms())?,
            ..Self::default()
        };

        if config.max_delay_ms < config.initial_delay_ms {
            return Err(ConfigError::invalid(
                RETRY_MAX_DELAY_MS_VAR,
                format!(
                    "{} is below {} ({})",
                    config.max_delay_ms, RETRY_INITIAL_DELAY_MS_VAR, config.initial_delay_ms
                ),
            ));
        }

        Ok(config)
    }

    /// A policy that makes exactly one attempt.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// Calculate the delay for a given retry attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let base_delay =
            (self.initial_delay_ms as f64) * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let jitter_range = capped_delay * self.jitter;
        let jitter = if jitter_range > 0.0 {
            use rand::Rng;
            rand::thread_rng().gen_range(-jitter_range..jitter_range)
        } else {
            0.0
        };

        let final_delay = (capped_delay + jitter).max(0.0);
        std::time::Duration::from_millis(final_delay as u64)
    }
}
