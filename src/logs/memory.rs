//! In-memory log group service (for testing only).

use std::{
    collections::HashSet,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU32, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{
    DESCRIBE_LOG_GROUPS, LogGroupDescriptor, LogGroupPage, LogGroupService, PUT_RETENTION_POLICY,
    ServiceError, ServiceErrorKind, ServiceResult,
};

/// Page size CloudWatch Logs uses when no limit is given.
const DEFAULT_PAGE_SIZE: usize = 50;

/// Log groups held in memory, with call counters and failure injection.
///
/// Listing is ordered by name. A successful `put_retention_policy` updates the
/// stored group, so a second run observes the first run's writes.
pub struct MemoryLogGroupService {
    groups: DashMap<String, Option<i32>>,
    page_size: usize,
    fail_list_on_page: Option<usize>,
    fail_put_for: HashSet<String>,
    throttled_puts: AtomicU32,
    repeat_token: bool,
    describe_calls: AtomicUsize,
    put_requests: Mutex<Vec<(String, i32)>>,
}

impl MemoryLogGroupService {
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            fail_list_on_page: None,
            fail_put_for: HashSet::new(),
            throttled_puts: AtomicU32::new(0),
            repeat_token: false,
            describe_calls: AtomicUsize::new(0),
            put_requests: Mutex::new(Vec::new()),
        }
    }

    /// Add a group with the given retention (`None` means no policy).
    pub fn with_group(self, name: impl Into<String>, retention_in_days: Option<i32>) -> Self {
        self.groups.insert(name.into(), retention_in_days);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fail the listing request for the given 0-indexed page.
    pub fn fail_list_on_page(mut self, page: usize) -> Self {
        self.fail_list_on_page = Some(page);
        self
    }

    /// Reject retention updates for `name` with a non-retryable error.
    pub fn fail_put_for(mut self, name: impl Into<String>) -> Self {
        self.fail_put_for.insert(name.into());
        self
    }

    /// Throttle the next `count` retention updates.
    pub fn throttle_puts(self, count: u32) -> Self {
        self.throttled_puts.store(count, Ordering::SeqCst);
        self
    }

    /// Return the same continuation token on every page.
    pub fn with_repeating_token(mut self) -> Self {
        self.repeat_token = true;
        self
    }

    /// Current retention of a group; outer `None` if the group does not exist.
    pub fn retention_of(&self, name: &str) -> Option<Option<i32>> {
        self.groups.get(name).map(|entry| *entry.value())
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    /// Every retention update received, successful or not, in arrival order.
    pub fn put_requests(&self) -> Vec<(String, i32)> {
        self.put_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn put_calls(&self) -> usize {
        self.put_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for MemoryLogGroupService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogGroupService for MemoryLogGroupService {
    async fn describe_log_groups(&self, next_token: Option<String>) -> ServiceResult<LogGroupPage> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);

        if self.repeat_token {
            return Ok(LogGroupPage {
                groups: Vec::new(),
                next_token: Some("again".to_string()),
            });
        }

        let offset = match next_token {
            Some(token) => token.parse::<usize>().map_err(|_| {
                ServiceError::new(
                    DESCRIBE_LOG_GROUPS,
                    ServiceErrorKind::Api {
                        code: "InvalidParameterException".to_string(),
                    },
                    format!("invalid next token '{}'", token),
                )
            })?,
            None => 0,
        };

        if self.fail_list_on_page == Some(offset / self.page_size) {
            return Err(ServiceError::new(
                DESCRIBE_LOG_GROUPS,
                ServiceErrorKind::Api {
                    code: "AccessDeniedException".to_string(),
                },
                "injected listing failure",
            ));
        }

        let names = self.sorted_names();
        let end = (offset + self.page_size).min(names.len());
        let groups = names
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|name| LogGroupDescriptor {
                name: Some(name.clone()),
                retention_in_days: self.retention_of(name).flatten(),
            })
            .collect();

        Ok(LogGroupPage {
            groups,
            next_token: (end < names.len()).then(|| end.to_string()),
        })
    }

    async fn put_retention_policy(
        &self,
        log_group_name: &str,
        retention_in_days: i32,
    ) -> ServiceResult<()> {
        self.put_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((log_group_name.to_string(), retention_in_days));

        let throttled = self
            .throttled_puts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if throttled {
            return Err(ServiceError::new(
                PUT_RETENTION_POLICY,
                ServiceErrorKind::Throttled,
                "Rate exceeded",
            ));
        }

        if self.fail_put_for.contains(log_group_name) {
            return Err(ServiceError::new(
                PUT_RETENTION_POLICY,
                ServiceErrorKind::Api {
                    code: "InvalidParameterException".to_string(),
                },
                "injected update failure",
            ));
        }

        match self.groups.get_mut(log_group_name) {
            Some(mut entry) => {
                *entry = Some(retention_in_days);
                Ok(())
            }
            None => Err(ServiceError::new(
                PUT_RETENTION_POLICY,
                ServiceErrorKind::Api {
                    code: "ResourceNotFoundException".to_string(),
                },
                format!("log group '{}' does not exist", log_group_name),
            )),
        }
    }
}
