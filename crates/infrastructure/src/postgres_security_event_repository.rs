//! PostgreSQL-backed repository for security events.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};

use fusion_application::SecurityEventRepository;
use fusion_core::{AppError, AppResult};
use fusion_domain::{SecurityEvent, ThreatCategory, ThreatLevel};

/// PostgreSQL implementation of the security event repository port.
#[derive(Clone)]
pub struct PostgresSecurityEventRepository {
    pool: PgPool,
}

impl PostgresSecurityEventRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct SecurityEventRow {
    id: uuid::Uuid,
    event_type: String,
    ip_address: String,
    user_agent: Option<String>,
    endpoint: String,
    request_method: String,
    request_body: Option<String>,
    threat_level: String,
    reason: String,
    blocked: bool,
    metadata: serde_json::Value,
    detected_at: DateTime<Utc>,
}

impl TryFrom<SecurityEventRow> for SecurityEvent {
    type Error = AppError;

    fn try_from(row: SecurityEventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: row.id,
            event_type: ThreatCategory::from_str(&row.event_type)?,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            endpoint: row.endpoint,
            request_method: row.request_method,
            request_body: row.request_body,
            threat_level: ThreatLevel::from_str(&row.threat_level)?,
            reason: row.reason,
            blocked: row.blocked,
            metadata: row.metadata,
            detected_at: row.detected_at,
        })
    }
}

#[async_trait]
impl SecurityEventRepository for PostgresSecurityEventRepository {
    async fn append_event(&self, event: SecurityEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO security_events (
                id,
                event_type,
                ip_address,
                user_agent,
                endpoint,
                request_method,
                request_body,
                threat_level,
                reason,
                blocked,
                metadata,
                detected_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(event.event_id)
        .bind(event.event_type.as_str())
        .bind(event.ip_address)
        .bind(event.user_agent)
        .bind(event.endpoint)
        .bind(event.request_method)
        .bind(event.request_body)
        .bind(event.threat_level.as_str())
        .bind(event.reason)
        .bind(event.blocked)
        .bind(event.metadata)
        .bind(event.detected_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append security event: {error}")))?;

        Ok(())
    }

    async fn count_recent_events(&self, ip_address: &str, window: Duration) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM security_events
            WHERE ip_address = $1
                AND detected_at > now() - make_interval(secs => $2::float8)
            "#,
        )
        .bind(ip_address)
        .bind(window.num_seconds() as f64)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count recent security events: {error}"))
        })?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn list_recent_events(&self, limit: u32) -> AppResult<Vec<SecurityEvent>> {
        let capped_limit = i64::from(limit.clamp(1, 200));
        let rows = sqlx::query_as::<_, SecurityEventRow>(
            r#"
            SELECT
                id,
                event_type,
                ip_address,
                user_agent,
                endpoint,
                request_method,
                request_body,
                threat_level,
                reason,
                blocked,
                metadata,
                detected_at
            FROM security_events
            ORDER BY detected_at DESC
            LIMIT $1
            "#,
        )
        .bind(capped_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list recent security events: {error}"))
        })?;

        rows.into_iter().map(SecurityEvent::try_from).collect()
    }
}
