use std::process::ExitCode;

use retention_keeper::{
    config::{KeeperConfig, LoggingConfig},
    logs::{CloudWatchLogsConfig, CloudWatchLogsService},
    observability,
    retention::{EXIT_FATAL, ReconcileError, Reconciler, RunReport},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Resolve everything before building the client, so bad input never
    // reaches AWS. Logging falls back to defaults until the rest is known
    // good, so a missing required variable is the error that gets reported.
    let resolved = KeeperConfig::from_env();
    let logging = match &resolved {
        Ok(config) => config.logging.clone(),
        Err(_) => LoggingConfig::default(),
    };

    if let Err(e) = observability::init_tracing(&logging) {
        eprintln!("{}", e);
        return ExitCode::from(EXIT_FATAL);
    }

    let config = match resolved {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    tracing::info!(
        retention_days = %config.retention.retention_days,
        exempt = config.retention.exempt_names.len(),
        patterns = config.retention.name_patterns.len(),
        apply_concurrency = config.retention.apply_concurrency,
        dry_run = config.retention.dry_run,
        "Starting retention reconciliation"
    );
    if let Ok(resolved) = serde_json::to_string(&config) {
        tracing::debug!(config = %resolved, "Resolved configuration");
    }

    let mut logs_config = CloudWatchLogsConfig::from_env();
    if let Some(endpoint_url) = &config.endpoint_url {
        logs_config = logs_config.with_endpoint_url(endpoint_url.clone());
    }
    let service = CloudWatchLogsService::new(logs_config).await;

    match Reconciler::new(service, config).run().await {
        Ok(report) => exit_status(&report),
        Err(e) => abort_status(&e),
    }
}

fn exit_status(report: &RunReport) -> ExitCode {
    if report.has_failures() {
        let failed: Vec<&str> = report.failed.iter().map(|f| f.log_group.as_str()).collect();
        tracing::error!(
            discovered = report.discovered,
            applied = report.applied.len(),
            failed = report.failed.len(),
            failed_groups = ?failed,
            duration_ms = report.duration_ms,
            "Reconciliation finished with failures"
        );
    } else {
        tracing::info!(
            discovered = report.discovered,
            exempt = report.exempt,
            unmatched = report.unmatched,
            already_retained = report.already_retained,
            applied = report.applied.len(),
            would_apply = report.would_apply.len(),
            dry_run = report.dry_run,
            duration_ms = report.duration_ms,
            "Reconciliation complete"
        );
    }
    ExitCode::from(report.exit_code())
}

fn abort_status(err: &ReconcileError) -> ExitCode {
    tracing::error!(error = %err, "Reconciliation aborted");
    ExitCode::from(err.exit_code())
}
