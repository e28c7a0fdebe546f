use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use fusion_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Threat categories recognized by the security gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    /// SQL injection signature found in a request body value.
    SqlInjection,
    /// Cross-site scripting signature found in a request body value.
    XssAttempt,
    /// Directory traversal signature found in a request body value.
    PathTraversal,
    /// Shell command injection signature found in a request body value.
    CommandInjection,
    /// Known offensive-tooling user agent.
    SuspiciousActivity,
    /// Sustained per-IP event volume over the burst threshold.
    BruteForce,
}

impl ThreatCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlInjection => "sql_injection",
            Self::XssAttempt => "xss_attempt",
            Self::PathTraversal => "path_traversal",
            Self::CommandInjection => "command_injection",
            Self::SuspiciousActivity => "suspicious_activity",
            Self::BruteForce => "brute_force",
        }
    }

    /// Returns all known categories.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ThreatCategory] = &[
            ThreatCategory::SqlInjection,
            ThreatCategory::XssAttempt,
            ThreatCategory::PathTraversal,
            ThreatCategory::CommandInjection,
            ThreatCategory::SuspiciousActivity,
            ThreatCategory::BruteForce,
        ];

        ALL
    }
}

impl FromStr for ThreatCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sql_injection" => Ok(Self::SqlInjection),
            "xss_attempt" => Ok(Self::XssAttempt),
            "path_traversal" => Ok(Self::PathTraversal),
            "command_injection" => Ok(Self::CommandInjection),
            "suspicious_activity" => Ok(Self::SuspiciousActivity),
            "brute_force" => Ok(Self::BruteForce),
            _ => Err(AppError::Validation(format!(
                "unknown threat category '{value}'"
            ))),
        }
    }
}

impl Display for ThreatCategory {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Coarse severity label attached to a detected security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    /// Immediate exploitation attempt.
    Critical,
    /// Likely hostile traffic.
    High,
    /// Anomalous but not clearly hostile.
    Medium,
    /// Informational.
    Low,
}

impl ThreatLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl FromStr for ThreatLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(AppError::Validation(format!(
                "unknown threat level '{value}'"
            ))),
        }
    }
}

impl Display for ThreatLevel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Request attributes captured alongside a detected threat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEventDraft {
    /// Source address of the offending request.
    pub ip_address: String,
    /// Caller user agent if present.
    pub user_agent: Option<String>,
    /// Endpoint name the request targeted.
    pub endpoint: String,
    /// HTTP method of the request.
    pub request_method: String,
    /// Raw request body, kept for forensics.
    pub request_body: Option<String>,
}

/// Append-only audit record for one detected threat.
///
/// Created exactly once per detection and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    /// Stable event identifier.
    pub event_id: Uuid,
    /// Detected threat category.
    pub event_type: ThreatCategory,
    /// Source address of the offending request.
    pub ip_address: String,
    /// Caller user agent if present.
    pub user_agent: Option<String>,
    /// Endpoint name the request targeted.
    pub endpoint: String,
    /// HTTP method of the request.
    pub request_method: String,
    /// Raw request body, kept for forensics.
    pub request_body: Option<String>,
    /// Severity assigned by the gate.
    pub threat_level: ThreatLevel,
    /// Human-readable explanation of the block.
    pub reason: String,
    /// Whether the request was rejected.
    pub blocked: bool,
    /// Detection details, typically the offending `{key, value}` pair.
    pub metadata: serde_json::Value,
    /// When the threat was detected.
    pub detected_at: DateTime<Utc>,
}

impl SecurityEvent {
    /// Creates a blocked-event record.
    ///
    /// Blocked events must always carry a non-empty reason; an empty reason
    /// is rejected with a validation error.
    pub fn blocked(
        event_type: ThreatCategory,
        threat_level: ThreatLevel,
        reason: impl Into<String>,
        metadata: serde_json::Value,
        draft: SecurityEventDraft,
    ) -> AppResult<Self> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "blocked security events require a non-empty reason".to_owned(),
            ));
        }

        Ok(Self {
            event_id: Uuid::new_v4(),
            event_type,
            ip_address: draft.ip_address,
            user_agent: draft.user_agent,
            endpoint: draft.endpoint,
            request_method: draft.request_method,
            request_body: draft.request_body,
            threat_level,
            reason,
            blocked: true,
            metadata,
            detected_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::{SecurityEvent, SecurityEventDraft, ThreatCategory, ThreatLevel};

    fn draft() -> SecurityEventDraft {
        SecurityEventDraft {
            ip_address: "203.0.113.9".to_owned(),
            user_agent: Some("curl/8.5".to_owned()),
            endpoint: "signup".to_owned(),
            request_method: "POST".to_owned(),
            request_body: Some("{}".to_owned()),
        }
    }

    #[test]
    fn category_roundtrip_storage_value() {
        for category in ThreatCategory::all() {
            let restored = ThreatCategory::from_str(category.as_str());
            assert_eq!(restored.ok(), Some(*category));
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        let parsed = ThreatCategory::from_str("ransomware");
        assert!(parsed.is_err());
    }

    #[test]
    fn level_roundtrip_storage_value() {
        let restored = ThreatLevel::from_str(ThreatLevel::Critical.as_str());
        assert_eq!(restored.ok(), Some(ThreatLevel::Critical));
    }

    #[test]
    fn blocked_event_requires_reason() {
        let result = SecurityEvent::blocked(
            ThreatCategory::SqlInjection,
            ThreatLevel::Critical,
            "  ",
            json!({}),
            draft(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn blocked_event_is_marked_blocked() {
        let result = SecurityEvent::blocked(
            ThreatCategory::XssAttempt,
            ThreatLevel::High,
            "XSS attempt detected",
            json!({"key": "comment"}),
            draft(),
        );
        assert!(result.as_ref().map(|event| event.blocked).unwrap_or(false));
    }
}
