pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{attempt_service::AttemptService, test_service::TestService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub test_service: TestService,
    pub attempt_service: AttemptService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let test_service = TestService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());

        Self {
            pool,
            test_service,
            attempt_service,
        }
    }
}

pub fn api_router(state: AppState, student_rps: u32) -> Router {
    let attempt_api = Router::new()
        .route(
            "/tests/:test_id/attempts",
            post(routes::attempts::create_attempt),
        )
        .route(
            "/tests/:test_id/attempts/:attempt_id",
            get(routes::attempts::get_attempt),
        )
        .route(
            "/tests/:test_id/attempts/:attempt_id/answers",
            post(routes::attempts::save_answer),
        )
        .route(
            "/tests/:test_id/attempts/:attempt_id/submit",
            post(routes::attempts::submit_test),
        )
        .route(
            "/tests/:test_id/attempts/:attempt_id/results",
            get(routes::attempts::get_results),
        )
        .route(
            "/tests/:test_id/attempts/:attempt_id/status",
            get(routes::attempts::get_status),
        )
        .layer(axum::middleware::from_fn(
            middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(student_rps),
            middleware::rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(attempt_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
