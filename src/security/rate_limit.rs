//! Sliding-window rate limiting per client identity.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Instant;

use crate::config::RateLimitConfig;

/// Limit applied to every client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl From<&RateLimitConfig> for WindowPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window_secs: config.window_secs,
        }
    }
}

/// Per-client log of admitted request timestamps (whole seconds).
///
/// Each client's read-prune-append runs while holding that key's shard
/// lock, so concurrent checks for one client serialize while unrelated
/// clients on other shards proceed in parallel.
///
/// Client entries are never evicted; the map grows with the number of
/// distinct identities seen.
pub struct SlidingWindowLimiter {
    clients: DashMap<String, VecDeque<u64>>,
    policy: ArcSwap<WindowPolicy>,
    epoch: Instant,
}

impl SlidingWindowLimiter {
    pub fn new(policy: WindowPolicy) -> Self {
        Self {
            clients: DashMap::new(),
            policy: ArcSwap::from_pointee(policy),
            epoch: Instant::now(),
        }
    }

    /// Replace the limit. Recorded timestamps are kept.
    pub fn set_policy(&self, policy: WindowPolicy) {
        self.policy.store(policy.into());
    }

    pub fn policy(&self) -> WindowPolicy {
        **self.policy.load()
    }

    /// Admit or reject a request from `client` arriving at `now` seconds.
    ///
    /// A rejected request is not recorded.
    pub fn admit(&self, client: &str, now: u64) -> bool {
        let policy = self.policy();
        let cutoff = now.saturating_sub(policy.window_secs);

        let mut log = match self.clients.get_mut(client) {
            Some(log) => log,
            None => self.clients.entry(client.to_owned()).or_default(),
        };

        while log.front().is_some_and(|&t| t < cutoff) {
            log.pop_front();
        }

        if log.len() >= policy.max_requests as usize {
            return false;
        }

        // Keep the log ascending even if a caller's clock steps backwards.
        let stamp = log.back().map_or(now, |&last| last.max(now));
        log.push_back(stamp);
        true
    }

    /// [`admit`](Self::admit) against the limiter's monotonic clock.
    pub fn admit_now(&self, client: &str) -> bool {
        self.admit(client, self.now())
    }

    /// Seconds elapsed since the limiter was created.
    pub fn now(&self) -> u64 {
        self.epoch.elapsed().as_secs()
    }

    /// Number of distinct client identities currently held.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Timestamps recorded for `client`, without pruning.
    pub fn recorded(&self, client: &str) -> usize {
        self.clients.get(client).map_or(0, |log| log.len())
    }
}
