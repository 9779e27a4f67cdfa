//! Apply the default retention policy to matched groups that lack one.
//!
//! Groups that already have a policy are never written, so a second pass over
//! a reconciled account issues no requests. A failure on one group does not
//! stop the others; failures are collected and returned with the successes.

use futures::{StreamExt, stream};
use serde::Serialize;
use tracing::{error, info};

use crate::{
    classify::ReconciliationSet,
    config::{RetentionDays, RetryConfig},
    logs::{LogGroupService, PUT_RETENTION_POLICY, ServiceError},
    retry::with_retry_generic,
};

/// A retention update that did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyFailure {
    pub log_group: String,
    pub error: String,
}

/// How the applier should behave.
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions<'a> {
    pub retention_days: RetentionDays,
    /// Maximum requests in flight. 1 applies groups one after another.
    pub concurrency: usize,
    pub dry_run: bool,
    pub retry: &'a RetryConfig,
}

/// What the applier did. All lists are sorted by group name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub applied: Vec<String>,
    pub would_apply: Vec<String>,
    pub failed: Vec<ApplyFailure>,
}

/// Set `options.retention_days` on every pending group in `set`.
pub async fn apply_default_retention<S>(
    service: &S,
    set: &ReconciliationSet,
    options: ApplyOptions<'_>,
) -> ApplyOutcome
where
    S: LogGroupService + ?Sized,
{
    let pending = set.pending();
    let mut outcome = ApplyOutcome::default();

    if options.dry_run {
        for name in pending {
            info!(
                log_group = %name,
                retention_days = %options.retention_days,
                "DRY RUN: Would apply retention policy"
            );
            outcome.would_apply.push(name);
        }
        return outcome;
    }

    let days = options.retention_days.get();
    let retry = options.retry;

    let results: Vec<(String, Result<(), ServiceError>)> = stream::iter(pending)
        .map(move |name| async move {
            let result = with_retry_generic(
                retry,
                PUT_RETENTION_POLICY,
                ServiceError::is_retryable,
                || service.put_retention_policy(&name, days),
            )
            .await;

            match &result {
                Ok(()) => info!(log_group = %name, retention_days = days, "Applied retention policy"),
                Err(e) => error!(
                    log_group = %name,
                    retention_days = days,
                    error = %e,
                    "Failed to apply retention policy"
                ),
            }

            (name, result)
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    for (name, result) in results {
        match result {
            Ok(()) => outcome.applied.push(name),
            Err(e) => outcome.failed.push(ApplyFailure {
                log_group: name,
                error: e.to_string(),
            }),
        }
    }

    outcome.applied.sort();
    outcome
        .failed
        .sort_by(|a, b| a.log_group.cmp(&b.log_group));

    outcome
}
