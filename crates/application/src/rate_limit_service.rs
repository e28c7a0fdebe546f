//! Fixed-window rate limiting behind a swappable store port.
//!
//! The store interface carries the whole window algorithm (conditional
//! increment with TTL semantics) so a process-local map and a distributed
//! cache are interchangeable without touching call sites.

use std::sync::Arc;

use async_trait::async_trait;

use fusion_core::AppResult;
use fusion_domain::{RateLimitPolicy, default_policies};

/// Store port for fixed-window counters.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Records one request against a key and returns the window state.
    ///
    /// Semantics, per key:
    /// - no entry, or the window expired: fresh window with `count = 1`,
    ///   allowed;
    /// - `count >= limit`: denied, count unchanged, existing reset time;
    /// - otherwise: increment, allowed.
    async fn hit(&self, key: &str, limit: u32, window_ms: u64) -> AppResult<WindowSnapshot>;

    /// Removes entries whose window has expired. Returns how many were
    /// dropped (stores with native TTL expiry may return 0).
    async fn cleanup_expired(&self) -> AppResult<u64>;
}

/// State of one counter window after a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    /// Whether the request fit in the window.
    pub allowed: bool,
    /// Requests counted in the active window.
    pub count: u32,
    /// Epoch milliseconds at which the window resets.
    pub reset_at_ms: u64,
}

/// Remaining-quota metadata reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaInfo {
    /// Window request budget.
    pub limit: u32,
    /// Requests left in the active window.
    pub remaining: u32,
    /// Epoch milliseconds at which the window resets.
    pub reset_at_ms: u64,
}

impl QuotaInfo {
    /// Seconds until the window resets, rounded up, at least 1.
    #[must_use]
    pub fn retry_after_seconds(&self, now_ms: u64) -> u64 {
        let remaining_ms = self.reset_at_ms.saturating_sub(now_ms);
        remaining_ms.div_ceil(1000).max(1)
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Path is exempt; no counter was touched.
    Exempt,
    /// Request fits in the window.
    Allowed(QuotaInfo),
    /// Window budget exhausted; respond 429.
    Denied(QuotaInfo),
}

/// File extensions that bypass rate limiting entirely.
const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    ".css", ".js", ".mjs", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp", ".woff",
    ".woff2", ".ttf", ".map", ".txt",
];

/// Namespace for internal endpoints that bypass rate limiting.
const INTERNAL_NAMESPACE: &str = "/internal/";

/// Returns whether a path bypasses rate limiting.
///
/// The root path, static assets, and the internal namespace pass straight
/// through.
#[must_use]
pub fn is_exempt_path(path: &str) -> bool {
    path == "/"
        || path.starts_with(INTERNAL_NAMESPACE)
        || STATIC_ASSET_EXTENSIONS
            .iter()
            .any(|extension| path.ends_with(extension))
}

/// Application service for the edge rate limiter.
#[derive(Clone)]
pub struct RateLimitService {
    store: Arc<dyn RateLimitStore>,
    policies: &'static [RateLimitPolicy],
}

impl RateLimitService {
    /// Creates a service over a store with the fixed policy table.
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            store,
            policies: default_policies(),
        }
    }

    /// Decides allow/deny for one request.
    ///
    /// The counter key is `"{client_ip}:{path}"` with the exact path, not
    /// the matched bucket: two signup-like paths share a policy but count
    /// independently.
    pub async fn check(&self, client_ip: &str, path: &str) -> AppResult<RateLimitDecision> {
        if is_exempt_path(path) {
            return Ok(RateLimitDecision::Exempt);
        }

        let policy = RateLimitPolicy::classify(self.policies, path);
        let key = format!("{client_ip}:{path}");
        let snapshot = self
            .store
            .hit(&key, policy.max_requests, policy.window_ms)
            .await?;

        let quota = QuotaInfo {
            limit: policy.max_requests,
            remaining: if snapshot.allowed {
                policy.max_requests.saturating_sub(snapshot.count)
            } else {
                0
            },
            reset_at_ms: snapshot.reset_at_ms,
        };

        if snapshot.allowed {
            Ok(RateLimitDecision::Allowed(quota))
        } else {
            tracing::debug!(%client_ip, %path, policy = policy.name, "rate limit exceeded");
            Ok(RateLimitDecision::Denied(quota))
        }
    }

    /// Removes expired counters. Intended for periodic cleanup.
    pub async fn cleanup(&self) -> AppResult<u64> {
        self.store.cleanup_expired().await
    }
}
