//! Per-client request quotas by role.
//!
//! Two interchangeable backends implement [`RateLimiter`]: a fixed-window counter keyed by
//! epoch bucket, and a sliding log of request timestamps. Both admit exactly
//! [`RateLimitPolicy::limit`] requests per window.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::core::InsiderError;

/// Caller role; each has its own quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Admin,
    SuperAdmin,
}

/// At most `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    fn window_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.window).unwrap_or(TimeDelta::MAX)
    }
}

impl Role {
    /// Default quota: 5, 50 and 100 requests per minute.
    pub const fn policy(self) -> RateLimitPolicy {
        let minute = Duration::from_secs(60);
        match self {
            Self::Client => RateLimitPolicy::new(5, minute),
            Self::Admin => RateLimitPolicy::new(50, minute),
            Self::SuperAdmin => RateLimitPolicy::new(100, minute),
        }
    }
}

/// Admission check for one request.
pub trait RateLimiter: Send + Sync {
    /// Record a request from `client_id` at `now`, or refuse it.
    ///
    /// # Errors
    ///
    /// [`InsiderError::RateLimited`] with the time until the client may retry.
    fn check(&self, client_id: &str, role: Role, now: DateTime<Utc>) -> Result<(), InsiderError>;
}

#[derive(Debug, Clone, Default)]
struct Policies(HashMap<Role, RateLimitPolicy>);

impl Policies {
    fn get(&self, role: Role) -> RateLimitPolicy {
        self.0.get(&role).copied().unwrap_or_else(|| role.policy())
    }
}

fn limited(retry_after: TimeDelta) -> InsiderError {
    InsiderError::RateLimited {
        retry_after: retry_after.to_std().unwrap_or_default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Bucket {
    client: String,
    window_secs: i64,
    epoch: i64,
}

/// Counts requests per `client_id` in aligned windows (`now / window`).
///
/// A burst straddling a window boundary can see up to twice the limit.
#[derive(Debug, Default)]
pub struct FixedWindowLimiter {
    policies: Policies,
    buckets: Mutex<HashMap<Bucket, u32>>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the quota for `role`.
    #[must_use]
    pub fn with_policy(mut self, role: Role, policy: RateLimitPolicy) -> Self {
        self.policies.0.insert(role, policy);
        self
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn check(&self, client_id: &str, role: Role, now: DateTime<Utc>) -> Result<(), InsiderError> {
        let policy = self.policies.get(role);
        let window_secs = i64::try_from(policy.window.as_secs()).unwrap_or(i64::MAX).max(1);
        let ts = now.timestamp();
        let epoch = ts.div_euclid(window_secs);

        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets.retain(|b, _| (b.epoch + 1).saturating_mul(b.window_secs) > ts);

        let count = buckets
            .entry(Bucket {
                client: client_id.to_owned(),
                window_secs,
                epoch,
            })
            .or_insert(0);
        if *count >= policy.limit {
            let reset = (epoch + 1).saturating_mul(window_secs);
            tracing::debug!(client_id, ?role, count = *count, "fixed-window limit reached");
            return Err(limited(TimeDelta::seconds(reset - ts)));
        }
        *count += 1;
        Ok(())
    }
}

/// Keeps each client's request times and counts those inside the trailing window.
#[derive(Debug, Default)]
pub struct SlidingLogLimiter {
    policies: Policies,
    logs: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl SlidingLogLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the quota for `role`.
    #[must_use]
    pub fn with_policy(mut self, role: Role, policy: RateLimitPolicy) -> Self {
        self.policies.0.insert(role, policy);
        self
    }
}

impl RateLimiter for SlidingLogLimiter {
    fn check(&self, client_id: &str, role: Role, now: DateTime<Utc>) -> Result<(), InsiderError> {
        let policy = self.policies.get(role);
        let window = policy.window_delta();
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        let log = logs.entry(client_id.to_owned()).or_default();
        while log.front().is_some_and(|t| *t <= cutoff) {
            log.pop_front();
        }

        if log.len() >= policy.limit as usize {
            let retry_after = log
                .front()
                .map_or(window, |oldest| (*oldest - cutoff).max(TimeDelta::zero()));
            tracing::debug!(client_id, ?role, in_window = log.len(), "sliding-log limit reached");
            return Err(limited(retry_after));
        }
        log.push_back(now);
        Ok(())
    }
}
