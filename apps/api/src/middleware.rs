use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use fusion_application::{QuotaInfo, RateLimitDecision};
use serde_json::json;

use crate::state::AppState;

/// Edge rate limiter, applied ahead of all routing.
///
/// Denied requests get a 429 with `Retry-After` and `X-RateLimit-*` headers;
/// allowed requests are forwarded and their responses decorated with the
/// same quota headers. Exempt paths pass through untouched. A store failure
/// degrades to pass-through: limiting is best effort, not a gate.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let client_ip = client_ip(request.headers());

    match state.rate_limit_service.check(&client_ip, &path).await {
        Ok(RateLimitDecision::Exempt) => next.run(request).await,
        Ok(RateLimitDecision::Allowed(quota)) => {
            let mut response = next.run(request).await;
            apply_quota_headers(response.headers_mut(), quota);
            response
        }
        Ok(RateLimitDecision::Denied(quota)) => {
            let retry_after = quota.retry_after_seconds(now_ms());
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "error": "Too many requests",
                    "retryAfter": retry_after,
                })),
            )
                .into_response();
            apply_quota_headers(response.headers_mut(), quota);
            insert_header(
                response.headers_mut(),
                header::RETRY_AFTER,
                &retry_after.to_string(),
            );
            response
        }
        Err(error) => {
            tracing::error!(%client_ip, %path, %error, "rate limit check failed, passing through");
            next.run(request).await
        }
    }
}

/// Resolves the client address from `x-forwarded-for`, first hop wins.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown")
        .to_owned()
}

fn apply_quota_headers(headers: &mut HeaderMap, quota: QuotaInfo) {
    insert_header(headers, "x-ratelimit-limit", &quota.limit.to_string());
    insert_header(headers, "x-ratelimit-remaining", &quota.remaining.to_string());
    insert_header(
        headers,
        "x-ratelimit-reset",
        &(quota.reset_at_ms / 1000).to_string(),
    );
}

fn insert_header<K>(headers: &mut HeaderMap, name: K, value: &str)
where
    K: axum::http::header::IntoHeaderName,
{
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
