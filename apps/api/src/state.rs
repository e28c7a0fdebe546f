use fusion_application::{
    RateLimitService, SecurityGateService, SignupService, VerificationService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub security_gate: SecurityGateService,
    pub rate_limit_service: RateLimitService,
    pub signup_service: SignupService,
    pub verification_service: VerificationService,
}
