//! `POST /api/v1/getToken` — the issue endpoint (C7), grounded in
//! `original_source/orcrist/handlers/get_token_handler.go` and
//! `original_source/orcrist/sessions/sessions.go`. Unlike the Go
//! original, DB errors propagate as `PipelineError::Database` rather
//! than being papered over with an in-memory fake session.

use std::sync::Arc;

use alas_common::error::{PipelineError, PipelineResult};
use alas_common::models::GetTokenRequest;
use alas_common::token::Token;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::future_tokens;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/getToken", post(get_token))
}

#[derive(Serialize)]
struct TokenResponse {
    status: &'static str,
    token: String,
    ttl: i64,
}

async fn get_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> PipelineResult<Json<TokenResponse>> {
    let goblin_header = headers.get("x-goblin").and_then(|v| v.to_str().ok());

    let old_token = match goblin_header {
        None => None,
        Some(raw) => Some(Token::decode(raw, &state.config.token_secret).map_err(|_| PipelineError::BadToken)?),
    };

    let now = chrono::Utc::now().timestamp();

    // Fresh enough: hand back the same token untouched.
    if let Some(old) = old_token {
        if old.expire_at > now {
            return Ok(Json(TokenResponse {
                status: "OK",
                token: goblin_header.unwrap().to_string(),
                ttl: old.expire_at,
            }));
        }
    }

    let request = GetTokenRequest::parse(&body)?;

    let token = match old_token {
        Some(old) => refresh_or_create(&state, &request, old.session_id, now).await?,
        None => create(&state, &request, now).await?,
    };

    if let Err(e) = future_tokens::generate_and_publish(
        &state.bus,
        &mut state.db.redis.clone(),
        &state.config.token_secret,
        token,
        now,
    )
    .await
    {
        tracing::warn!(error = %e, session_id = %token.session_id, "failed to refill token pool");
    }

    let encoded = token.encode(&state.config.token_secret).map_err(|e| PipelineError::Internal(e.into()))?;

    Ok(Json(TokenResponse {
        status: "OK",
        token: encoded,
        ttl: token.expire_at,
    }))
}

async fn create(state: &AppState, request: &GetTokenRequest, now: i64) -> PipelineResult<Token> {
    let mut tx = state.db.pg.begin().await?;

    let device = alas_db::repository::devices::get_or_create_device(
        &mut tx,
        request.device_info.device_id,
        &request.event_source,
        serde_json::Value::Null,
    )
    .await?;

    let session = alas_db::repository::sessions::create_session(
        &mut tx,
        Uuid::new_v4(),
        device.device_id,
        future_tokens::SESSION_DURATION_SECS,
    )
    .await?;

    tx.commit().await?;

    let _ = now;
    Ok(Token::new(session.session_id, session.device_id, session.ends_at.timestamp()))
}

async fn refresh_or_create(
    state: &AppState,
    request: &GetTokenRequest,
    session_id: Uuid,
    now: i64,
) -> PipelineResult<Token> {
    let alive = alas_db::repository::sessions::get_alive_session(&state.db.pg, session_id).await?;
    if alive.is_none() {
        return create(state, request, now).await;
    }

    let refreshed = alas_db::repository::sessions::refresh_session(
        &state.db.pg,
        session_id,
        future_tokens::SESSION_DURATION_SECS,
    )
    .await?;

    match refreshed {
        Some(session) => Ok(Token::new(session.session_id, session.device_id, session.ends_at.timestamp())),
        None => create(state, request, now).await,
    }
}
