//! Log group discovery.
//!
//! Walks the paginated `DescribeLogGroups` listing and reduces each
//! descriptor to a [`GroupRecord`]. A failed page aborts discovery; callers
//! never see a partial listing.

use tracing::{debug, warn};

use crate::{
    config::RetryConfig,
    logs::{DESCRIBE_LOG_GROUPS, LogGroupDescriptor, LogGroupService, ServiceError},
    retry::with_retry_generic,
};

/// A discovered log group and whether it already has a retention policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub has_retention: bool,
}

impl GroupRecord {
    pub fn new(name: impl Into<String>, has_retention: bool) -> Self {
        Self {
            name: name.into(),
            has_retention,
        }
    }

    fn from_descriptor(descriptor: LogGroupDescriptor) -> Option<Self> {
        let has_retention = descriptor.retention_in_days.is_some();
        descriptor.name.map(|name| Self {
            name,
            has_retention,
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to list log groups (page {page}): {source}")]
pub struct DiscoveryError {
    /// 0-indexed page whose request failed.
    pub page: usize,
    pub source: ServiceError,
}

/// Lazily fetches log group pages, one request per [`next_page`] call.
///
/// [`next_page`]: LogGroupPaginator::next_page
pub struct LogGroupPaginator<'a, S: ?Sized> {
    service: &'a S,
    retry: &'a RetryConfig,
    next_token: Option<String>,
    pages_fetched: usize,
    done: bool,
}

impl<'a, S> LogGroupPaginator<'a, S>
where
    S: LogGroupService + ?Sized,
{
    pub fn new(service: &'a S, retry: &'a RetryConfig) -> Self {
        Self {
            service,
            retry,
            next_token: None,
            pages_fetched: 0,
            done: false,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        !self.done
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetch the next page. Returns `Ok(None)` once the listing is exhausted.
    ///
    /// After an error the paginator is finished and yields nothing further.
    pub async fn next_page(&mut self) -> Result<Option<Vec<GroupRecord>>, DiscoveryError> {
        if self.done {
            return Ok(None);
        }

        let service = self.service;
        let token = self.next_token.take();
        let page = with_retry_generic(
            self.retry,
            DESCRIBE_LOG_GROUPS,
            ServiceError::is_retryable,
            || service.describe_log_groups(token.clone()),
        )
        .await
        .map_err(|source| {
            self.done = true;
            DiscoveryError {
                page: self.pages_fetched,
                source,
            }
        })?;

        self.pages_fetched += 1;

        match page.next_token {
            Some(next) if token.as_ref() == Some(&next) => {
                warn!(
                    token = %next,
                    pages = self.pages_fetched,
                    "Service repeated the previous continuation token, stopping pagination"
                );
                self.done = true;
            }
            Some(next) => self.next_token = Some(next),
            None => self.done = true,
        }

        let records = page
            .groups
            .into_iter()
            .filter_map(|descriptor| {
                let record = GroupRecord::from_descriptor(descriptor);
                if record.is_none() {
                    warn!("Skipping log group without a name");
                }
                record
            })
            .collect();

        Ok(Some(records))
    }
}

/// Drain every page into memory.
pub async fn discover_all<S>(
    service: &S,
    retry: &RetryConfig,
) -> Result<Vec<GroupRecord>, DiscoveryError>
where
    S: LogGroupService + ?Sized,
{
    let mut paginator = LogGroupPaginator::new(service, retry);
    let mut records = Vec::new();

    while let Some(page) = paginator.next_page().await? {
        records.extend(page);
    }

    debug!(
        groups = records.len(),
        pages = paginator.pages_fetched(),
        "Discovered log groups"
    );

    Ok(records)
}
