//! CloudWatch Logs implementation.
//!
//! Uses the AWS SDK for Rust with the standard credential chain (environment,
//! shared config files, Lambda execution role, etc.).

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
};

use super::{
    DESCRIBE_LOG_GROUPS, LogGroupDescriptor, LogGroupPage, LogGroupService, PUT_RETENTION_POLICY,
    ServiceError, ServiceErrorKind, ServiceResult,
};

/// Configuration for the CloudWatch Logs client.
///
/// Region and credentials always come from the `aws-config` default chain.
#[derive(Debug, Clone, Default)]
pub struct CloudWatchLogsConfig {
    /// Optional endpoint URL for testing with localstack
    pub endpoint_url: Option<String>,
}

impl CloudWatchLogsConfig {
    /// Create a config with no endpoint override.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set a custom endpoint URL (useful for localstack testing).
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }
}

/// [`LogGroupService`] backed by CloudWatch Logs.
pub struct CloudWatchLogsService {
    client: Client,
}

impl CloudWatchLogsService {
    /// Create a client from the ambient AWS configuration.
    ///
    /// SDK-level retries are turned off; callers wrap each request in
    /// [`crate::retry::with_retry_generic`] instead.
    pub async fn new(config: CloudWatchLogsConfig) -> Self {
        let aws_config = aws_config::from_env()
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .load()
            .await;

        let mut logs_config = aws_sdk_cloudwatchlogs::config::Builder::from(&aws_config);

        if let Some(endpoint_url) = &config.endpoint_url {
            logs_config = logs_config.endpoint_url(endpoint_url);
        }

        Self {
            client: Client::from_conf(logs_config.build()),
        }
    }

    /// Wrap an already configured SDK client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogGroupService for CloudWatchLogsService {
    async fn describe_log_groups(&self, next_token: Option<String>) -> ServiceResult<LogGroupPage> {
        let output = self
            .client
            .describe_log_groups()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| service_error(DESCRIBE_LOG_GROUPS, e))?;

        let groups = output
            .log_groups()
            .iter()
            .map(|group| LogGroupDescriptor {
                name: group.log_group_name().map(str::to_string),
                retention_in_days: group.retention_in_days(),
            })
            .collect();

        Ok(LogGroupPage {
            groups,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn put_retention_policy(
        &self,
        log_group_name: &str,
        retention_in_days: i32,
    ) -> ServiceResult<()> {
        self.client
            .put_retention_policy()
            .log_group_name(log_group_name)
            .retention_in_days(retention_in_days)
            .send()
            .await
            .map_err(|e| service_error(PUT_RETENTION_POLICY, e))?;

        Ok(())
    }
}

/// Convert an SDK error into a [`ServiceError`], keeping the service error code.
fn service_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let kind = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ServiceErrorKind::Transport
        }
        _ => ServiceErrorKind::from_code(err.code()),
    };

    ServiceError::new(operation, kind, DisplayErrorContext(&err).to_string())
}
