//! Gateway Rate Limiting Module
//!
//! Fixed-window counter per client key. The store sits behind
//! [`RateLimitStore`] so a multi-instance deployment can swap the in-memory
//! map for a shared atomic-increment store without touching the handler.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Limit applied to every client key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window closes.
    pub reset_in: Duration,
}

impl RateDecision {
    /// Whole seconds for a `Retry-After` header, never below one.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs() + u64::from(self.reset_in.subsec_nanos() > 0);
        secs.max(1)
    }
}

/// Counter storage consulted before every forwarded request.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Atomically check the key's quota and count this request if allowed.
    async fn check_and_increment(&self, key: &str) -> anyhow::Result<RateDecision>;

    /// Drop counters whose window has closed. Returns how many were removed.
    async fn sweep_expired(&self) -> usize {
        0
    }
}

struct Bucket {
    count: u32,
    window_start: Instant,
}

/// Process-local store. The mutex makes check-then-increment atomic across
/// concurrent requests on this instance; counts are not shared across
/// instances.
pub struct InMemoryRateLimitStore {
    policy: RateLimitPolicy,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl InMemoryRateLimitStore {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let policy = self.policy;
        let mut buckets = self.buckets.lock().await;

        let Some(bucket) = buckets.get_mut(key) else {
            buckets.insert(
                key.to_string(),
                Bucket {
                    count: 1,
                    window_start: now,
                },
            );
            debug!(key = %key, "Rate limit bucket created");
            return RateDecision {
                allowed: true,
                remaining: policy.max_requests.saturating_sub(1),
                reset_in: policy.window,
            };
        };

        let elapsed = now.saturating_duration_since(bucket.window_start);
        if elapsed > policy.window {
            bucket.count = 1;
            bucket.window_start = now;
            debug!(key = %key, "Rate limit window reset");
            return RateDecision {
                allowed: true,
                remaining: policy.max_requests.saturating_sub(1),
                reset_in: policy.window,
            };
        }

        let reset_in = policy.window - elapsed;
        if bucket.count >= policy.max_requests {
            warn!(key = %key, count = bucket.count, "Rate limit exceeded");
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_in,
            };
        }

        bucket.count += 1;
        debug!(key = %key, count = bucket.count, max = policy.max_requests, "Rate limit OK");
        RateDecision {
            allowed: true,
            remaining: policy.max_requests - bucket.count,
            reset_in,
        }
    }

    pub async fn sweep_at(&self, now: Instant) -> usize {
        let window = self.policy.window;
        let mut buckets = self.buckets.lock().await;
        let before = buckets.len();
        buckets.retain(|_, b| now.saturating_duration_since(b.window_start) <= window);
        before - buckets.len()
    }

    pub async fn tracked_keys(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn check_and_increment(&self, key: &str) -> anyhow::Result<RateDecision> {
        Ok(self.check_at(key, Instant::now()).await)
    }

    async fn sweep_expired(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }
}

/// Cheap-to-clone handle shared by the router.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    pub fn in_memory(policy: RateLimitPolicy) -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new(policy)))
    }

    pub async fn check_and_increment(&self, client: &str) -> anyhow::Result<RateDecision> {
        self.store.check_and_increment(client).await
    }

    pub async fn sweep_expired(&self) -> usize {
        self.store.sweep_expired().await
    }
}
