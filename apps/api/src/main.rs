//! Fusion API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use fusion_application::{
    RateLimitService, RateLimitStore, SecurityGateService, SignupService, VerificationService,
};
use fusion_core::AppError;
use fusion_infrastructure::{
    InMemoryRateLimitStore, PostgresAccountRepository, PostgresSecurityEventRepository,
    RedisRateLimitStore,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    // Rate limit counters: process-local by default, shared via Redis when
    // REDIS_URL is configured.
    let rate_limit_store: Arc<dyn RateLimitStore> = match env::var("REDIS_URL") {
        Ok(redis_url) => {
            let client = redis::Client::open(redis_url)
                .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
            info!("using redis rate limit store");
            Arc::new(RedisRateLimitStore::new(client, "fusion:ratelimit"))
        }
        Err(_) => Arc::new(InMemoryRateLimitStore::new()),
    };
    let rate_limit_service = RateLimitService::new(rate_limit_store);

    let security_event_repository = Arc::new(PostgresSecurityEventRepository::new(pool.clone()));
    let security_gate = SecurityGateService::new(security_event_repository);

    let account_repository = Arc::new(PostgresAccountRepository::new(pool.clone()));
    let signup_service = SignupService::new(account_repository);

    let app_state = AppState {
        security_gate,
        rate_limit_service: rate_limit_service.clone(),
        signup_service,
        verification_service: VerificationService::new(),
    };

    spawn_rate_limit_cleanup(rate_limit_service);

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(handlers::health_handler))
        .route("/health", get(handlers::health_handler))
        .route("/auth/signup", post(handlers::signup_handler))
        .route("/api/verify", post(handlers::verify_handler))
        .route(
            "/internal/security/events",
            get(handlers::list_security_events_handler),
        )
        .layer(from_fn_with_state(app_state.clone(), middleware::rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "fusion-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn spawn_rate_limit_cleanup(service: RateLimitService) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            match service.cleanup().await {
                Ok(dropped) if dropped > 0 => {
                    tracing::debug!(dropped, "expired rate limit counters removed");
                }
                Ok(_) => {}
                Err(error) => tracing::warn!(%error, "rate limit cleanup failed"),
            }
        }
    });
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
