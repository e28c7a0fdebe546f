use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use fusion_application::{RequestContext, SignupInput, VerificationRequest};
use fusion_core::AppError;
use serde::Deserialize;

use crate::dto::{
    AccountResponse, HealthResponse, SecurityEventResponse, SignupRequest, VerificationResponse,
    VerifyRequest,
};
use crate::error::ApiResult;
use crate::middleware::client_ip;
use crate::state::AppState;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Runs the security gate over the buffered request body.
///
/// Blocked verdicts become 403 responses; the audit outcome never changes
/// the decision.
async fn enforce_gate(
    state: &AppState,
    headers: &HeaderMap,
    method: &Method,
    endpoint: &str,
    raw_body: &str,
) -> Result<(), AppError> {
    let context = RequestContext {
        ip_address: client_ip(headers),
        user_agent: headers
            .get("user-agent")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned),
        endpoint: endpoint.to_owned(),
        method: method.as_str().to_owned(),
        raw_body: raw_body.to_owned(),
    };

    let verdict = state.security_gate.check_request(&context).await;
    match verdict.decision {
        fusion_application::GateDecision::Allowed => Ok(()),
        fusion_application::GateDecision::Blocked {
            reason,
            threat_level,
            ..
        } => Err(AppError::SecurityBlocked {
            reason,
            threat_level: threat_level.as_str().to_owned(),
        }),
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(raw_body: &str) -> Result<T, AppError> {
    serde_json::from_str(raw_body)
        .map_err(|error| AppError::Validation(format!("invalid request body: {error}")))
}

pub async fn signup_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    // Bodies are taken as raw bytes and decoded lossily: a non-UTF-8 body
    // is still scanned by the gate instead of being rejected before it.
    let raw_body = String::from_utf8_lossy(&body);
    enforce_gate(&state, &headers, &method, "signup", &raw_body).await?;

    let payload: SignupRequest = decode_json(&raw_body)?;
    let account = state
        .signup_service
        .sign_up(SignupInput {
            email: payload.email,
            display_name: payload.display_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            account_id: account.account_id,
            email: account.email.as_str().to_owned(),
            display_name: account.display_name,
            created_at: account.created_at,
        }),
    ))
}

pub async fn verify_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<VerificationResponse>> {
    let raw_body = String::from_utf8_lossy(&body);
    enforce_gate(&state, &headers, &method, "verify", &raw_body).await?;

    let payload: VerifyRequest = decode_json(&raw_body)?;
    let report = state.verification_service.verify(&VerificationRequest {
        file_name: payload.file_name,
        checksum: payload.checksum,
    })?;

    Ok(Json(VerificationResponse::from(report)))
}

#[derive(Debug, Deserialize)]
pub struct SecurityEventQuery {
    #[serde(default = "default_event_limit")]
    pub limit: u32,
}

fn default_event_limit() -> u32 {
    50
}

pub async fn list_security_events_handler(
    State(state): State<AppState>,
    Query(query): Query<SecurityEventQuery>,
) -> ApiResult<Json<Vec<SecurityEventResponse>>> {
    let events = state
        .security_gate
        .recent_events(query.limit)
        .await?
        .into_iter()
        .map(SecurityEventResponse::from)
        .collect();

    Ok(Json(events))
}
