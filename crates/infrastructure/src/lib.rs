//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_rate_limit_store;
mod postgres_account_repository;
mod postgres_security_event_repository;
mod redis_rate_limit_store;

pub use in_memory_rate_limit_store::InMemoryRateLimitStore;
pub use postgres_account_repository::PostgresAccountRepository;
pub use postgres_security_event_repository::PostgresSecurityEventRepository;
pub use redis_rate_limit_store::RedisRateLimitStore;
