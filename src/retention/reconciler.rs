//! Runs discovery, classification and apply in order.

use std::time::Instant;

use serde::Serialize;

use crate::{
    apply::{ApplyFailure, ApplyOptions, apply_default_retention},
    classify::Classifier,
    config::{ConfigError, KeeperConfig},
    discovery::{DiscoveryError, discover_all},
    logs::LogGroupService,
};

/// Exit status for a clean run, including one that wrote nothing.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit status when the run could not complete (configuration, logging or discovery).
pub const EXIT_FATAL: u8 = 1;
/// Exit status when the run completed but some retention updates failed.
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Results from a single reconciliation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Number of log groups listed.
    pub discovered: usize,
    /// Number of groups skipped because they are on the omit list.
    pub exempt: usize,
    /// Number of groups matching no name pattern.
    pub unmatched: usize,
    /// Number of matched groups that already had a retention policy.
    pub already_retained: usize,
    /// Groups whose retention was set during this run.
    pub applied: Vec<String>,
    /// Groups that would have been updated (dry run only).
    pub would_apply: Vec<String>,
    /// Groups whose update failed.
    pub failed: Vec<ApplyFailure>,
    pub dry_run: bool,
    /// Duration of the run in milliseconds.
    pub duration_ms: u64,
}

impl RunReport {
    /// Check if any update failed.
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Check if the run changed anything.
    pub fn has_changes(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Process exit status for this run.
    pub fn exit_code(&self) -> u8 {
        if self.has_failures() {
            EXIT_PARTIAL_FAILURE
        } else {
            EXIT_SUCCESS
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl ReconcileError {
    /// Every variant stops the run before it completes.
    pub fn exit_code(&self) -> u8 {
        EXIT_FATAL
    }
}

/// Brings matched log groups in line with the default retention policy.
pub struct Reconciler<S> {
    service: S,
    config: KeeperConfig,
}

impl<S: LogGroupService> Reconciler<S> {
    pub fn new(service: S, config: KeeperConfig) -> Self {
        Self { service, config }
    }

    /// Resolve configuration from `lookup` before touching the service.
    pub fn from_lookup<F>(service: S, lookup: F) -> Result<Self, ReconcileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = KeeperConfig::from_lookup(lookup)?;
        Ok(Self::new(service, config))
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// Run one reconciliation pass.
    ///
    /// Only a listing failure is an error. Failed updates are returned in
    /// [`RunReport::failed`] after every other group has been attempted.
    #[tracing::instrument(
        name = "reconcile",
        skip_all,
        fields(
            retention_days = %self.config.retention.retention_days,
            dry_run = self.config.retention.dry_run,
        )
    )]
    pub async fn run(&self) -> Result<RunReport, ReconcileError> {
        let started = Instant::now();
        let retention = &self.config.retention;

        let records = discover_all(&self.service, &self.config.retry).await?;
        let classified = Classifier::from_config(retention).build_set(&records);

        tracing::debug!(
            discovered = records.len(),
            matched = classified.set.len(),
            exempt = classified.exempt,
            unmatched = classified.unmatched,
            "Classified log groups"
        );

        let outcome = apply_default_retention(
            &self.service,
            &classified.set,
            ApplyOptions {
                retention_days: retention.retention_days,
                concurrency: retention.apply_concurrency,
                dry_run: retention.dry_run,
                retry: &self.config.retry,
            },
        )
        .await;

        Ok(RunReport {
            discovered: records.len(),
            exempt: classified.exempt,
            unmatched: classified.unmatched,
            already_retained: classified.set.retained(),
            applied: outcome.applied,
            would_apply: outcome.would_apply,
            failed: outcome.failed,
            dry_run: retention.dry_run,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}
