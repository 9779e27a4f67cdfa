//! Retention reconciliation settings.
//!
//! Two inputs are required: the exemption list and the default retention in
//! days. The name patterns are built in; the job only ever looks at Lambda
//! log groups.

use std::collections::BTreeSet;

use regex::Regex;
use serde::{Serialize, Serializer, ser::SerializeSeq};

use super::{ConfigError, parse_flag, parse_or, required};

pub const OMIT_LIST_VAR: &str = "OMIT_LIST";
pub const RETENTION_DAYS_VAR: &str = "RETENTION_DAYS";
pub const DRY_RUN_VAR: &str = "DRY_RUN";
pub const APPLY_CONCURRENCY_VAR: &str = "APPLY_CONCURRENCY";

/// Name patterns a log group must match to be reconciled.
///
/// Patterns are unanchored regular expressions, so a pattern matches when it
/// is found anywhere in the name.
pub const DEFAULT_NAME_PATTERNS: &[&str] = &["/aws/lambda/*"];

/// Retention values accepted by CloudWatch Logs.
pub const VALID_RETENTION_DAYS: [i32; 21] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1827, 2192, 2556, 2922, 3288,
    3653,
];

/// A retention period in days, restricted to the values CloudWatch accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i32")]
pub struct RetentionDays(i32);

impl RetentionDays {
    /// Returns `None` if `days` is not one of [`VALID_RETENTION_DAYS`].
    pub fn new(days: i32) -> Option<Self> {
        VALID_RETENTION_DAYS.contains(&days).then_some(Self(days))
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl From<RetentionDays> for i32 {
    fn from(days: RetentionDays) -> Self {
        days.0
    }
}

impl std::fmt::Display for RetentionDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Ordered list of compiled name patterns.
#[derive(Debug, Clone, Default)]
pub struct NamePatterns(Vec<Regex>);

impl NamePatterns {
    pub fn compile<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// True if any pattern is found in `name`, checked in order.
    ///
    /// An empty pattern list never matches.
    pub fn is_match(&self, name: &str) -> bool {
        self.0.iter().any(|pattern| pattern.is_match(name))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for NamePatterns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for pattern in &self.0 {
            seq.serialize_element(pattern.as_str())?;
        }
        seq.end()
    }
}

/// What to reconcile and how.
#[derive(Debug, Clone, Serialize)]
pub struct RetentionConfig {
    /// Log group names that are never touched, compared exactly.
    pub exempt_names: BTreeSet<String>,

    /// A group must match one of these to be considered.
    pub name_patterns: NamePatterns,

    /// Retention applied to matched groups that have none.
    pub retention_days: RetentionDays,

    /// Log what would change without writing anything.
    /// Default: false
    pub dry_run: bool,

    /// Maximum number of retention updates in flight at once.
    /// Default: 1 (sequential)
    pub apply_concurrency: usize,
}

impl RetentionConfig {
    pub(super) fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let omit_list = required(lookup, OMIT_LIST_VAR)?;
        let retention_days = required(lookup, RETENTION_DAYS_VAR)?;

        let exempt_names = parse_omit_list(&omit_list);
        let retention_days = parse_retention_days(&retention_days)?;

        let name_patterns = NamePatterns::compile(DEFAULT_NAME_PATTERNS)
            .map_err(|e| ConfigError::invalid("name pattern", e.to_string()))?;

        let dry_run = parse_flag(lookup, DRY_RUN_VAR)?;
        let apply_concurrency = parse_or(lookup, APPLY_CONCURRENCY_VAR, 1usize)?;
        if apply_concurrency == 0 {
            return Err(ConfigError::invalid(
                APPLY_CONCURRENCY_VAR,
                "must be at least 1",
            ));
        }

        Ok(Self {
            exempt_names,
            name_patterns,
            retention_days,
            dry_run,
            apply_concurrency,
        })
    }

    /// Check whether a log group name is exempt from reconciliation.
    pub fn is_exempt(&self, name: &str) -> bool {
        self.exempt_names.contains(name)
    }
}

/// Split the omit list on commas. Entries are kept verbatim, whitespace
/// included, because names are matched exactly.
fn parse_omit_list(raw: &str) -> BTreeSet<String> {
    raw.split(',').map(str::to_string).collect()
}

fn parse_retention_days(raw: &str) -> Result<RetentionDays, ConfigError> {
    let days: i32 = raw.parse().map_err(|e| {
        ConfigError::invalid(RETENTION_DAYS_VAR, format!("'{}' is not an integer: {}", raw, e))
    })?;

    RetentionDays::new(days).ok_or_else(|| {
        ConfigError::invalid(
            RETENTION_DAYS_VAR,
            format!(
                "{} is not a supported retention period (expected one of {:?})",
                days, VALID_RETENTION_DAYS
            ),
        )
    })
}
