//! Process-local fixed-window counter store.
//!
//! State lives in one process and is lost on restart; concurrent instances
//! keep independent counters. That is accepted degraded behavior for edge
//! deployments, not an error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use fusion_application::{RateLimitStore, WindowSnapshot};
use fusion_core::AppResult;
use fusion_domain::RateLimitEntry;

type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

fn system_now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// In-memory implementation of the rate limit store port.
#[derive(Clone)]
pub struct InMemoryRateLimitStore {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
    clock: Clock,
}

impl InMemoryRateLimitStore {
    /// Creates a store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(system_now_ms))
    }

    /// Creates a store with an injected clock (epoch milliseconds).
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Returns the number of live counter entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns whether the store holds no counters.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for InMemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str, limit: u32, window_ms: u64) -> AppResult<WindowSnapshot> {
        let now = (self.clock)();
        let mut entries = self.entries.lock().await;

        match entries.get_mut(key) {
            Some(entry) if now <= entry.reset_at_ms => {
                if entry.count >= limit {
                    return Ok(WindowSnapshot {
                        allowed: false,
                        count: entry.count,
                        reset_at_ms: entry.reset_at_ms,
                    });
                }

                entry.count += 1;
                Ok(WindowSnapshot {
                    allowed: true,
                    count: entry.count,
                    reset_at_ms: entry.reset_at_ms,
                })
            }
            _ => {
                // First request of a window, or a stale entry to replace.
                let fresh = RateLimitEntry {
                    count: 1,
                    reset_at_ms: now + window_ms,
                };
                entries.insert(key.to_owned(), fresh);
                Ok(WindowSnapshot {
                    allowed: true,
                    count: 1,
                    reset_at_ms: fresh.reset_at_ms,
                })
            }
        }
    }

    async fn cleanup_expired(&self) -> AppResult<u64> {
        let now = (self.clock)();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.reset_at_ms);
        Ok((before - entries.len()) as u64)
    }
}
