//! `GET /health` — for load balancers and readiness probes. Bare, not
//! nested under `/api/v1`, matching the teacher's own health route.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_ok = alas_db::postgres::health_check(&state.db.pg).await;
    Json(HealthResponse {
        status: if db_ok { "healthy" } else { "degraded" },
    })
}
