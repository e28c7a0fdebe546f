//! Security gate: ordered threat checks run before business logic.
//!
//! The gate is fail-closed on the request and fail-open on the audit trail:
//! a detected threat always blocks, but a failure to persist the audit
//! record never reverses the decision. The verdict type keeps the two
//! outcomes separate instead of hiding the audit result.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;

use fusion_core::AppResult;
use fusion_domain::{SecurityEvent, SecurityEventDraft, ThreatCategory, ThreatLevel};

use crate::body_scanner::{parse_request_body, scan_body};
use crate::threat_patterns::is_suspicious_user_agent;

/// Repository port for security event persistence.
#[async_trait]
pub trait SecurityEventRepository: Send + Sync {
    /// Appends one detected-threat record. Append-only; no update path.
    async fn append_event(&self, event: SecurityEvent) -> AppResult<()>;

    /// Counts persisted events for an IP within the trailing window.
    async fn count_recent_events(&self, ip_address: &str, window: Duration) -> AppResult<u64>;

    /// Lists the most recent events for the monitoring feed, newest first.
    async fn list_recent_events(&self, limit: u32) -> AppResult<Vec<SecurityEvent>>;
}

/// Request attributes the gate inspects.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Client address, as reported by the edge.
    pub ip_address: String,
    /// Caller user agent if present.
    pub user_agent: Option<String>,
    /// Endpoint name used in audit records.
    pub endpoint: String,
    /// HTTP method.
    pub method: String,
    /// Raw request body; parsed (or wrapped) before scanning.
    pub raw_body: String,
}

impl RequestContext {
    fn draft(&self) -> SecurityEventDraft {
        SecurityEventDraft {
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            endpoint: self.endpoint.clone(),
            request_method: self.method.clone(),
            request_body: Some(self.raw_body.clone()),
        }
    }
}

/// The gate's block/allow decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Request may proceed to business logic.
    Allowed,
    /// Request must be rejected with HTTP 403.
    Blocked {
        /// Detected threat category.
        category: ThreatCategory,
        /// Severity assigned to the detection.
        threat_level: ThreatLevel,
        /// Human-readable reason surfaced to the caller.
        reason: String,
    },
}

impl GateDecision {
    /// Returns whether the request was blocked.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// Outcome of the audit write that accompanies a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// No block, so no audit record was due.
    NotAttempted,
    /// The security event was persisted.
    Recorded,
    /// Persisting failed; the failure was logged and swallowed.
    Failed,
}

/// Combined result of one gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateVerdict {
    /// Block/allow decision; authoritative for the HTTP response.
    pub decision: GateDecision,
    /// Whether the audit record for a block landed.
    pub audit: AuditOutcome,
}

/// Body checks in evaluation order. Ordering is significant: the first
/// matching category wins and later checks never run.
const BODY_CHECKS: &[(ThreatCategory, ThreatLevel, &str)] = &[
    (
        ThreatCategory::SqlInjection,
        ThreatLevel::Critical,
        "SQL Injection attempt detected",
    ),
    (
        ThreatCategory::XssAttempt,
        ThreatLevel::High,
        "XSS attempt detected",
    ),
    (
        ThreatCategory::PathTraversal,
        ThreatLevel::High,
        "Path traversal attempt detected",
    ),
    (
        ThreatCategory::CommandInjection,
        ThreatLevel::Critical,
        "Command injection attempt detected",
    ),
];

/// Application service orchestrating the threat checks.
#[derive(Clone)]
pub struct SecurityGateService {
    repository: Arc<dyn SecurityEventRepository>,
    burst_threshold: u64,
    burst_window: Duration,
}

impl SecurityGateService {
    /// Default number of events per IP per window that trips the burst check.
    pub const DEFAULT_BURST_THRESHOLD: u64 = 50;

    /// Creates a gate with the default burst settings (50 events / 60 s).
    #[must_use]
    pub fn new(repository: Arc<dyn SecurityEventRepository>) -> Self {
        Self::with_burst_settings(
            repository,
            Self::DEFAULT_BURST_THRESHOLD,
            Duration::seconds(60),
        )
    }

    /// Creates a gate with explicit burst threshold and window.
    #[must_use]
    pub fn with_burst_settings(
        repository: Arc<dyn SecurityEventRepository>,
        burst_threshold: u64,
        burst_window: Duration,
    ) -> Self {
        Self {
            repository,
            burst_threshold,
            burst_window,
        }
    }

    /// Runs the ordered threat checks for one request.
    ///
    /// Checks short-circuit: the first hit blocks and later checks are never
    /// evaluated. Every blocking branch writes exactly one security event;
    /// the audit outcome is reported alongside the decision.
    pub async fn check_request(&self, context: &RequestContext) -> GateVerdict {
        let body = parse_request_body(&context.raw_body);

        for (category, level, reason) in BODY_CHECKS {
            if let Some(hit) = scan_body(*category, &body) {
                let audit = self
                    .record(
                        context,
                        *category,
                        *level,
                        reason,
                        json!({ "key": hit.key, "value": hit.value }),
                    )
                    .await;
                return GateVerdict {
                    decision: GateDecision::Blocked {
                        category: *category,
                        threat_level: *level,
                        reason: (*reason).to_owned(),
                    },
                    audit,
                };
            }
        }

        if let Some(user_agent) = context.user_agent.as_deref()
            && is_suspicious_user_agent(user_agent)
        {
            let reason = "Suspicious user agent detected";
            let audit = self
                .record(
                    context,
                    ThreatCategory::SuspiciousActivity,
                    ThreatLevel::High,
                    reason,
                    json!({ "user_agent": user_agent }),
                )
                .await;
            return GateVerdict {
                decision: GateDecision::Blocked {
                    category: ThreatCategory::SuspiciousActivity,
                    threat_level: ThreatLevel::High,
                    reason: reason.to_owned(),
                },
                audit,
            };
        }

        if self.is_bursting(&context.ip_address).await {
            let reason = "Excessive security events from this address";
            let audit = self
                .record(
                    context,
                    ThreatCategory::BruteForce,
                    ThreatLevel::High,
                    reason,
                    json!({ "window_seconds": self.burst_window.num_seconds() }),
                )
                .await;
            return GateVerdict {
                decision: GateDecision::Blocked {
                    category: ThreatCategory::BruteForce,
                    threat_level: ThreatLevel::High,
                    reason: reason.to_owned(),
                },
                audit,
            };
        }

        GateVerdict {
            decision: GateDecision::Allowed,
            audit: AuditOutcome::NotAttempted,
        }
    }

    /// Returns the newest persisted events for the monitoring feed.
    pub async fn recent_events(&self, limit: u32) -> AppResult<Vec<SecurityEvent>> {
        self.repository.list_recent_events(limit).await
    }

    async fn is_bursting(&self, ip_address: &str) -> bool {
        match self
            .repository
            .count_recent_events(ip_address, self.burst_window)
            .await
        {
            Ok(count) => count > self.burst_threshold,
            Err(error) => {
                // The burst signal degrades to "not bursting" when the
                // backing store is unreachable; the request itself is not
                // failed on an infrastructure error.
                tracing::error!(%ip_address, %error, "burst check failed");
                false
            }
        }
    }

    async fn record(
        &self,
        context: &RequestContext,
        category: ThreatCategory,
        level: ThreatLevel,
        reason: &str,
        metadata: serde_json::Value,
    ) -> AuditOutcome {
        let event = match SecurityEvent::blocked(category, level, reason, metadata, context.draft())
        {
            Ok(event) => event,
            Err(error) => {
                tracing::error!(%category, %error, "failed to build security event");
                return AuditOutcome::Failed;
            }
        };

        match self.repository.append_event(event).await {
            Ok(()) => AuditOutcome::Recorded,
            Err(error) => {
                tracing::error!(%category, %error, "failed to persist security event");
                AuditOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests;
