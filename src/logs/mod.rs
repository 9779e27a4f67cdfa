//! Access to the log-aggregation service.
//!
//! The reconciler only needs two calls: list log groups one page at a time,
//! and set the retention policy on one group. Both are behind
//! [`LogGroupService`] so the run can be driven against CloudWatch Logs or an
//! in-memory double.

mod cloudwatch;
mod memory;

use async_trait::async_trait;
pub use cloudwatch::{CloudWatchLogsConfig, CloudWatchLogsService};
pub use memory::MemoryLogGroupService;

/// A log group as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupDescriptor {
    /// Group name. The service schema allows it to be absent.
    pub name: Option<String>,
    /// Retention in days, `None` when the group keeps events forever.
    pub retention_in_days: Option<i32>,
}

/// One page of a log group listing.
#[derive(Debug, Clone, Default)]
pub struct LogGroupPage {
    pub groups: Vec<LogGroupDescriptor>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Request rate exceeded.
    Throttled,
    /// The service reported itself unavailable or aborted the operation.
    Unavailable,
    /// No usable response: timeout, connection failure, unparseable reply.
    Transport,
    /// Any other error returned by the service.
    Api { code: String },
}

impl ServiceErrorKind {
    /// Map a service error code onto a kind.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("ThrottlingException" | "Throttling" | "TooManyRequestsException") => {
                Self::Throttled
            }
            Some("ServiceUnavailableException" | "OperationAbortedException") => Self::Unavailable,
            Some(code) => Self::Api {
                code: code.to_string(),
            },
            None => Self::Api {
                code: "Unknown".to_string(),
            },
        }
    }
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Throttled => f.write_str("throttled"),
            Self::Unavailable => f.write_str("unavailable"),
            Self::Transport => f.write_str("transport"),
            Self::Api { code } => f.write_str(code),
        }
    }
}

/// Error returned by a [`LogGroupService`] call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} failed ({kind}): {message}")]
pub struct ServiceError {
    pub operation: &'static str,
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(operation: &'static str, kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ServiceErrorKind::Throttled
                | ServiceErrorKind::Unavailable
                | ServiceErrorKind::Transport
        )
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub const DESCRIBE_LOG_GROUPS: &str = "DescribeLogGroups";
pub const PUT_RETENTION_POLICY: &str = "PutRetentionPolicy";

/// The two operations the reconciler consumes.
#[async_trait]
pub trait LogGroupService: Send + Sync {
    /// Fetch one page of log groups. Pass the previous page's token to continue.
    async fn describe_log_groups(&self, next_token: Option<String>) -> ServiceResult<LogGroupPage>;

    /// Set the retention policy of a single log group.
    async fn put_retention_policy(&self, log_group_name: &str, retention_in_days: i32)
    -> ServiceResult<()>;
}

#[async_trait]
impl<T: LogGroupService + ?Sized> LogGroupService for std::sync::Arc<T> {
    async fn describe_log_groups(&self, next_token: Option<String>) -> ServiceResult<LogGroupPage> {
        (**self).describe_log_groups(next_token).await
    }

    async fn put_retention_policy(
        &self,
        log_group_name: &str,
        retention_in_days: i32,
    ) -> ServiceResult<()> {
        (**self)
            .put_retention_policy(log_group_name, retention_in_days)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_code() {
        assert_eq!(
            ServiceErrorKind::from_code(Some("ThrottlingException")),
            ServiceErrorKind::Throttled
        );
        assert_eq!(
            ServiceErrorKind::from_code(Some("OperationAbortedException")),
            ServiceErrorKind::Unavailable
        );
        assert_eq!(
            ServiceErrorKind::from_code(Some("InvalidParameterException")),
            ServiceErrorKind::Api {
                code: "InvalidParameterException".into()
            }
        );
        assert_eq!(
            ServiceErrorKind::from_code(None),
            ServiceErrorKind::Api {
                code: "Unknown".into()
            }
        );
    }

    #[test]
    fn test_retryable_kinds() {
        let err = |kind| ServiceError::new(PUT_RETENTION_POLICY, kind, "boom");
        assert!(err(ServiceErrorKind::Throttled).is_retryable());
        assert!(err(ServiceErrorKind::Unavailable).is_retryable());
        assert!(err(ServiceErrorKind::Transport).is_retryable());
        assert!(
            !err(ServiceErrorKind::Api {
                code: "ResourceNotFoundException".into()
            })
            .is_retryable()
        );
    }

    #[test]
    fn test_error_display() {
        let err = ServiceError::new(
            DESCRIBE_LOG_GROUPS,
            ServiceErrorKind::Throttled,
            "Rate exceeded",
        );
        assert_eq!(
            err.to_string(),
            "DescribeLogGroups failed (throttled): Rate exceeded"
        );
    }
}
