//! Configuration for a reconciliation run.
//!
//! The job takes no arguments. Everything it needs is read once at start-up
//! from environment-style key/value input and then passed by value into the
//! components that need it; nothing below this module reads the environment.
//!
//! # Example
//!
//! ```text
//! OMIT_LIST=/aws/lambda/keep-me,/aws/lambda/audit
//! RETENTION_DAYS=30
//! DRY_RUN=false
//! APPLY_CONCURRENCY=4
//! LOG_FORMAT=json
//! ```

mod observability;
mod retention;
mod retry;

use std::str::FromStr;

pub use observability::*;
pub use retention::*;
pub use retry::*;
use serde::Serialize;

/// Optional endpoint override for the CloudWatch Logs client (local emulators).
pub const LOGS_ENDPOINT_URL_VAR: &str = "LOGS_ENDPOINT_URL";

/// Everything a reconciliation run needs.
#[derive(Debug, Clone, Serialize)]
pub struct KeeperConfig {
    /// What to reconcile and which default to apply.
    pub retention: RetentionConfig,

    /// Retry policy for remote calls.
    pub retry: RetryConfig,

    /// Subscriber level and format.
    pub logging: LoggingConfig,

    /// Endpoint override for the CloudWatch Logs client.
    pub endpoint_url: Option<String>,
}

impl KeeperConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Resolve configuration from an arbitrary key/value source.
    ///
    /// Required inputs are checked first, so a missing `OMIT_LIST` or
    /// `RETENTION_DAYS` is reported before any optional value is parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let retention = RetentionConfig::from_lookup(&lookup)?;
        let retry = RetryConfig::from_lookup(&lookup)?;
        let logging = LoggingConfig::from_lookup(&lookup)?;
        let endpoint_url = lookup(LOGS_ENDPOINT_URL_VAR).filter(|url| !url.is_empty());

        Ok(Self {
            retention,
            retry,
            logging,
            endpoint_url,
        })
    }
}

/// Lookup function backed by `std::env`.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Read a variable that must be present. An empty value counts as present.
fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).ok_or(ConfigError::Missing(var))
}

/// Parse an optional variable, falling back to `default` when unset or empty.
fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(var, format!("'{}': {}", raw, e))),
        _ => Ok(default),
    }
}

/// Parse an optional boolean flag. Accepts `true/false`, `1/0`, `yes/no`.
fn parse_flag<F>(lookup: &F, var: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(false);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        _ => Err(ConfigError::invalid(
            var,
            format!("'{}' is not a boolean", raw),
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::{test_support::lookup_from, *};

    #[test]
    fn test_minimal_config() {
        let config = KeeperConfig::from_lookup(lookup_from(&[
            ("OMIT_LIST", "/aws/lambda/keep-me"),
            ("RETENTION_DAYS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.retention.retention_days.get(), 30);
        assert!(config.retention.exempt_names.contains("/aws/lambda/keep-me"));
        assert!(!config.retention.dry_run);
        assert_eq!(config.retention.apply_concurrency, 1);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.endpoint_url, None);
    }

    #[test]
    fn test_missing_omit_list() {
        let err = KeeperConfig::from_lookup(lookup_from(&[("RETENTION_DAYS", "30")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OMIT_LIST")));
    }

    #[test]
    fn test_missing_reported_before_invalid_optional() {
        // A malformed optional value must not mask a missing required one.
        let err = KeeperConfig::from_lookup(lookup_from(&[
            ("OMIT_LIST", ""),
            ("MAX_RETRIES", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RETENTION_DAYS")));
    }

    #[test]
    fn test_missing_reported_before_invalid_logging() {
        let err = KeeperConfig::from_lookup(lookup_from(&[
            ("RETENTION_DAYS", "30"),
            ("LOG_FORMAT", "cef"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OMIT_LIST")));

        let err = KeeperConfig::from_lookup(lookup_from(&[
            ("OMIT_LIST", ""),
            ("RETENTION_DAYS", "30"),
            ("LOG_FORMAT", "cef"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LOG_FORMAT", .. }));
    }

    #[test]
    fn test_logging_resolved_with_run_config() {
        let config = KeeperConfig::from_lookup(lookup_from(&[
            ("OMIT_LIST", ""),
            ("RETENTION_DAYS", "30"),
            ("LOG_FORMAT", "json"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_endpoint_override() {
        let config = KeeperConfig::from_lookup(lookup_from(&[
            ("OMIT_LIST", ""),
            ("RETENTION_DAYS", "7"),
            ("LOGS_ENDPOINT_URL", "http://localhost:4566"),
        ]))
        .unwrap();
        assert_eq!(
            config.endpoint_url,
            Some("http://localhost:4566".to_string())
        );
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("OMIT_LIST", Some("/aws/lambda/a,/aws/lambda/b")),
                ("RETENTION_DAYS", Some("14")),
                ("DRY_RUN", Some("true")),
            ],
            || {
                let config = KeeperConfig::from_env().unwrap();
                assert_eq!(config.retention.retention_days.get(), 14);
                assert_eq!(config.retention.exempt_names.len(), 2);
                assert!(config.retention.dry_run);
            },
        );
    }

    #[test]
    fn test_from_env_missing() {
        temp_env::with_vars(
            [("OMIT_LIST", None::<&str>), ("RETENTION_DAYS", Some("14"))],
            || {
                let err = KeeperConfig::from_env().unwrap_err();
                assert!(matches!(err, ConfigError::Missing("OMIT_LIST")));
            },
        );
    }

    #[test]
    fn test_parse_flag_values() {
        for (raw, expected) in [("1", true), ("YES", true), ("false", false), ("", false)] {
            let lookup = lookup_from(&[("FLAG", raw)]);
            assert_eq!(parse_flag(&lookup, "FLAG").unwrap(), expected, "{raw}");
        }

        let lookup = lookup_from(&[("FLAG", "maybe")]);
        assert!(parse_flag(&lookup, "FLAG").is_err());
    }
}
