use chrono::{DateTime, Utc};
use fusion_domain::{SecurityEvent, TamperSegment, VerificationReport, VerificationVerdict};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for signup.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// API representation of a created account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Incoming payload for audio verification.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub file_name: String,
    pub checksum: String,
}

/// API representation of a verification report.
#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub report_id: Uuid,
    pub authenticity_score: u8,
    pub verdict: VerificationVerdict,
    pub segments: Vec<TamperSegment>,
    pub analyzed_at: DateTime<Utc>,
}

impl From<VerificationReport> for VerificationResponse {
    fn from(report: VerificationReport) -> Self {
        Self {
            report_id: report.report_id,
            authenticity_score: report.authenticity_score,
            verdict: report.verdict,
            segments: report.segments,
            analyzed_at: report.analyzed_at,
        }
    }
}

/// API representation of a security event for the monitoring feed.
#[derive(Debug, Serialize)]
pub struct SecurityEventResponse {
    pub event_id: Uuid,
    pub event_type: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub endpoint: String,
    pub request_method: String,
    pub request_body: Option<String>,
    pub threat_level: String,
    pub reason: String,
    pub blocked: bool,
    pub metadata: serde_json::Value,
    pub detected_at: DateTime<Utc>,
}

impl From<SecurityEvent> for SecurityEventResponse {
    fn from(event: SecurityEvent) -> Self {
        Self {
            event_id: event.event_id,
            event_type: event.event_type.as_str().to_owned(),
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            endpoint: event.endpoint,
            request_method: event.request_method,
            request_body: event.request_body,
            threat_level: event.threat_level.as_str().to_owned(),
            reason: event.reason,
            blocked: event.blocked,
            metadata: event.metadata,
            detected_at: event.detected_at,
        }
    }
}
