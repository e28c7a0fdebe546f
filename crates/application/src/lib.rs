//! Application services and ports.

#![forbid(unsafe_code)]

mod body_scanner;
mod rate_limit_service;
mod security_gate_service;
mod signup_service;
mod threat_patterns;
mod verification_service;

pub use body_scanner::{ScanHit, parse_request_body, scan_body};
pub use rate_limit_service::{
    QuotaInfo, RateLimitDecision, RateLimitService, RateLimitStore, WindowSnapshot, is_exempt_path,
};
pub use security_gate_service::{
    AuditOutcome, GateDecision, GateVerdict, RequestContext, SecurityEventRepository,
    SecurityGateService,
};
pub use signup_service::{AccountRepository, SignupInput, SignupService};
pub use threat_patterns::{body_patterns, is_suspicious_user_agent, matches_category};
pub use verification_service::{VerificationRequest, VerificationService};
