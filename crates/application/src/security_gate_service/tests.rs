use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;

use fusion_core::{AppError, AppResult};
use fusion_domain::{SecurityEvent, ThreatCategory, ThreatLevel};

use super::{
    AuditOutcome, GateDecision, RequestContext, SecurityEventRepository, SecurityGateService,
};

struct FakeRepository {
    events: Mutex<Vec<SecurityEvent>>,
    recent_count: u64,
    fail_appends: AtomicBool,
    fail_counts: AtomicBool,
}

impl FakeRepository {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            recent_count: 0,
            fail_appends: AtomicBool::new(false),
            fail_counts: AtomicBool::new(false),
        }
    }

    fn with_recent_count(recent_count: u64) -> Self {
        Self {
            recent_count,
            ..Self::new()
        }
    }
}

#[async_trait]
impl SecurityEventRepository for FakeRepository {
    async fn append_event(&self, event: SecurityEvent) -> AppResult<()> {
        if self.fail_appends.load(Ordering::Relaxed) {
            return Err(AppError::Internal("event store unavailable".to_owned()));
        }

        self.events.lock().await.push(event);
        Ok(())
    }

    async fn count_recent_events(&self, _ip_address: &str, _window: Duration) -> AppResult<u64> {
        if self.fail_counts.load(Ordering::Relaxed) {
            return Err(AppError::Internal("event store unavailable".to_owned()));
        }

        Ok(self.recent_count)
    }

    async fn list_recent_events(&self, limit: u32) -> AppResult<Vec<SecurityEvent>> {
        let events = self.events.lock().await;
        Ok(events.iter().rev().take(limit as usize).cloned().collect())
    }
}

fn context(raw_body: &str) -> RequestContext {
    RequestContext {
        ip_address: "198.51.100.7".to_owned(),
        user_agent: Some("Mozilla/5.0 Firefox/142.0".to_owned()),
        endpoint: "signup".to_owned(),
        method: "POST".to_owned(),
        raw_body: raw_body.to_owned(),
    }
}

fn blocked_category(decision: &GateDecision) -> Option<ThreatCategory> {
    match decision {
        GateDecision::Blocked { category, .. } => Some(*category),
        GateDecision::Allowed => None,
    }
}

#[tokio::test]
async fn sql_injection_body_is_blocked_with_one_critical_event() {
    let repository = Arc::new(FakeRepository::new());
    let gate = SecurityGateService::new(repository.clone());

    let verdict = gate
        .check_request(&context(r#"{"email": "a' OR '1'='1"}"#))
        .await;

    match verdict.decision {
        GateDecision::Blocked {
            category,
            threat_level,
            reason,
        } => {
            assert_eq!(category, ThreatCategory::SqlInjection);
            assert_eq!(threat_level, ThreatLevel::Critical);
            assert_eq!(reason, "SQL Injection attempt detected");
        }
        GateDecision::Allowed => panic!("expected a blocked verdict"),
    }
    assert_eq!(verdict.audit, AuditOutcome::Recorded);

    let events = repository.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, ThreatCategory::SqlInjection);
    assert!(events[0].blocked);
    assert!(!events[0].reason.is_empty());
}

#[tokio::test]
async fn sql_check_runs_before_xss_and_short_circuits() {
    let repository = Arc::new(FakeRepository::new());
    let gate = SecurityGateService::new(repository.clone());

    // Body carries both an XSS and a SQLi payload; only SQLi is reported.
    let verdict = gate
        .check_request(&context(
            r#"{"bio": "<script>alert(1)</script>", "name": "x' OR 1=1"}"#,
        ))
        .await;

    assert_eq!(
        blocked_category(&verdict.decision),
        Some(ThreatCategory::SqlInjection)
    );
    let events = repository.events.lock().await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn tool_user_agent_is_blocked_despite_clean_body() {
    let repository = Arc::new(FakeRepository::new());
    let gate = SecurityGateService::new(repository.clone());

    let mut request = context(r#"{"email": "ana@example.com"}"#);
    request.user_agent = Some("sqlmap/1.5".to_owned());

    let verdict = gate.check_request(&request).await;

    assert_eq!(
        blocked_category(&verdict.decision),
        Some(ThreatCategory::SuspiciousActivity)
    );
    let events = repository.events.lock().await;
    assert_eq!(events[0].threat_level, ThreatLevel::High);
}

#[tokio::test]
async fn burst_over_threshold_is_blocked_as_brute_force() {
    let repository = Arc::new(FakeRepository::with_recent_count(51));
    let gate = SecurityGateService::new(repository.clone());

    let verdict = gate.check_request(&context("{}")).await;

    assert_eq!(
        blocked_category(&verdict.decision),
        Some(ThreatCategory::BruteForce)
    );
    let events = repository.events.lock().await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn burst_at_threshold_is_still_allowed() {
    let repository = Arc::new(FakeRepository::with_recent_count(50));
    let gate = SecurityGateService::new(repository);

    let verdict = gate.check_request(&context("{}")).await;

    assert_eq!(verdict.decision, GateDecision::Allowed);
    assert_eq!(verdict.audit, AuditOutcome::NotAttempted);
}

#[tokio::test]
async fn audit_write_failure_never_reverses_the_block() {
    let repository = Arc::new(FakeRepository::new());
    repository.fail_appends.store(true, Ordering::Relaxed);
    let gate = SecurityGateService::new(repository.clone());

    let verdict = gate
        .check_request(&context(r#"{"q": "1 UNION SELECT * FROM users"}"#))
        .await;

    assert!(verdict.decision.is_blocked());
    assert_eq!(verdict.audit, AuditOutcome::Failed);
}

#[tokio::test]
async fn burst_count_failure_degrades_to_allowed() {
    let repository = Arc::new(FakeRepository::new());
    repository.fail_counts.store(true, Ordering::Relaxed);
    let gate = SecurityGateService::new(repository);

    let verdict = gate.check_request(&context("{}")).await;

    assert_eq!(verdict.decision, GateDecision::Allowed);
}

#[tokio::test]
async fn clean_request_is_allowed_without_events() {
    let repository = Arc::new(FakeRepository::new());
    let gate = SecurityGateService::new(repository.clone());

    let verdict = gate
        .check_request(&context(r#"{"email": "ana@example.com", "plan": "pro"}"#))
        .await;

    assert_eq!(verdict.decision, GateDecision::Allowed);
    assert!(repository.events.lock().await.is_empty());
}

#[tokio::test]
async fn malformed_body_is_scanned_as_raw_text() {
    let repository = Arc::new(FakeRepository::new());
    let gate = SecurityGateService::new(repository);

    let verdict = gate.check_request(&context("email=x' OR '1'='1")).await;

    assert_eq!(
        blocked_category(&verdict.decision),
        Some(ThreatCategory::SqlInjection)
    );
}
