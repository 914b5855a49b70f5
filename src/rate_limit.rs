//! Per-client request quotas
//!
//! Weibo limits calls per user and hour. The facade keeps local counters
//! that are decremented before each guarded call and rejects the call with
//! [`WeiboError::TooManyRequests`] once a counter is exhausted, without
//! touching the network. When the wall clock passes the end of the current
//! window the request counter is re-read from the server's
//! `account/rate_limit_status` endpoint.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::WeiboError;

pub const REQUEST_LIMIT: i64 = 20_000;
pub const STATUS_LIMIT: i64 = 90;
pub const MESSAGE_LIMIT: i64 = 180;
pub const LIMIT_RESET_INTERVAL: Duration = Duration::from_secs(3600);

/// Quota limits and window length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub request_limit: i64,
    pub status_limit: i64,
    pub message_limit: i64,
    pub reset_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_limit: REQUEST_LIMIT,
            status_limit: STATUS_LIMIT,
            message_limit: MESSAGE_LIMIT,
            reset_interval: LIMIT_RESET_INTERVAL,
        }
    }
}

/// Which counter a guarded call consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    /// Every API request
    Request,
    /// Posting statuses and comments
    Status,
    /// Sending direct messages
    Message,
}

#[derive(Debug)]
struct Counters {
    request: i64,
    status: i64,
    message: i64,
    reset_at: i64,
}

impl Counters {
    fn get_mut(&mut self, quota: Quota) -> &mut i64 {
        match quota {
            Quota::Request => &mut self.request,
            Quota::Status => &mut self.status,
            Quota::Message => &mut self.message,
        }
    }
}

/// Quota counters of one client
pub struct RateLimiter {
    config: RateLimitConfig,
    counters: Mutex<Counters>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn interval_secs(interval: Duration) -> i64 {
    i64::try_from(interval.as_secs()).unwrap_or(i64::MAX)
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        let reset_at = clock
            .now()
            .saturating_add(interval_secs(config.reset_interval));
        Self {
            counters: Mutex::new(Counters {
                request: config.request_limit,
                status: config.status_limit,
                message: config.message_limit,
                reset_at,
            }),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Remaining calls for a quota in the current window
    pub async fn remaining(&self, quota: Quota) -> i64 {
        *self.counters.lock().await.get_mut(quota)
    }

    /// End of the current window in epoch seconds
    pub async fn reset_at(&self) -> i64 {
        self.counters.lock().await.reset_at
    }

    /// Restore every counter to its configured limit.
    pub async fn reset(&self) {
        let mut counters = self.counters.lock().await;
        counters.request = self.config.request_limit;
        counters.status = self.config.status_limit;
        counters.message = self.config.message_limit;
    }

    /// Consume one unit of each quota.
    ///
    /// `refresh` is awaited only when the window has elapsed and must yield
    /// the server's remaining request count; if it fails the configured
    /// request limit is used. No counter is decremented unless all of them
    /// have room.
    pub async fn acquire<F, Fut>(
        &self,
        quotas: &[Quota],
        message: &str,
        refresh: F,
    ) -> Result<(), WeiboError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, WeiboError>>,
    {
        let mut counters = self.counters.lock().await;

        let now = self.clock.now();
        if now > counters.reset_at {
            let remaining = match refresh().await {
                Ok(remaining) => remaining,
                Err(e) => {
                    warn!("[Weibo] rate limit refresh failed: {}", e);
                    self.config.request_limit
                }
            };
            info!("[Weibo] rate limit window reset, {} requests remaining", remaining);
            counters.request = remaining;
            counters.status = self.config.status_limit;
            counters.message = self.config.message_limit;
            counters.reset_at = now.saturating_add(interval_secs(self.config.reset_interval));
        }

        if quotas.iter().any(|q| *counters.get_mut(*q) < 1) {
            return Err(WeiboError::TooManyRequests(message.to_string()));
        }
        for quota in quotas {
            *counters.get_mut(*quota) -= 1;
        }
        Ok(())
    }
}
