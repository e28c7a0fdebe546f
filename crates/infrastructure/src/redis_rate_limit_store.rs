//! Redis-backed fixed-window counter store.
//!
//! Lets multiple edge instances share one set of counters. The conditional
//! increment runs as a Lua script so the check-then-increment is atomic.

use async_trait::async_trait;
use chrono::Utc;
use redis::Script;

use fusion_application::{RateLimitStore, WindowSnapshot};
use fusion_core::{AppError, AppResult};

const HIT_SCRIPT: &str = r#"
local key = KEYS[1]
local limit = tonumber(ARGV[1])
local window_ms = tonumber(ARGV[2])

local count = tonumber(redis.call('GET', key) or '0')
if count >= limit then
  return {0, count, redis.call('PTTL', key)}
end

count = redis.call('INCR', key)
local ttl = redis.call('PTTL', key)
if ttl < 0 then
  redis.call('PEXPIRE', key, window_ms)
  ttl = window_ms
end

return {1, count, ttl}
"#;

/// Redis implementation of the rate limit store port.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisRateLimitStore {
    /// Creates a store with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn hit(&self, key: &str, limit: u32, window_ms: u64) -> AppResult<WindowSnapshot> {
        if window_ms == 0 {
            return Err(AppError::Validation(
                "window_ms must be greater than zero".to_owned(),
            ));
        }

        let redis_key = self.key_for(key);
        let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))?;

        let script = Script::new(HIT_SCRIPT);
        let (allowed, count, ttl_ms): (i64, i64, i64) = script
            .key(redis_key)
            .arg(limit)
            .arg(window_ms)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to record redis rate limit hit: {error}"))
            })?;

        let count = u32::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid redis hit count: {error}")))?;
        // A denied hit on a key without TTL reports -1; fall back to a full
        // window so the caller still gets a usable reset time.
        let ttl_ms = u64::try_from(ttl_ms).unwrap_or(window_ms);

        Ok(WindowSnapshot {
            allowed: allowed == 1,
            count,
            reset_at_ms: now_ms + ttl_ms,
        })
    }

    async fn cleanup_expired(&self) -> AppResult<u64> {
        // Counter keys expire automatically via PEXPIRE.
        Ok(0)
    }
}
