//! `POST /api/v1/track` — the track endpoint (C8).
//!
//! Grounded in `original_source/kiwi/handlers/track_handler.go`, with one
//! deliberate deviation: the Go original only rotates a token and forwards
//! to `keep-alive` when `event.event_type == "orc-event"`, otherwise it
//! forwards to `kiwi-events` with no token in the response. `spec.md`
//! §4.8 describes a single unconditional ten-step pipeline with no such
//! branch — every tracked event rotates a token and gets one back. To
//! honor both the unconditional algorithm and the topic table in §6
//! (which names `kiwi-events` as "event forwarded downstream" and
//! `keep-alive` as "consumed by C6"), every track call here publishes the
//! built `OutEvent` to *both* topics: `kiwi-events` for generic
//! downstream forwarding (this is what scenario 7 in §8 checks), and
//! `keep-alive` so C6 always has a chance to prolong the session and
//! refill the token pool, matching the `C8 → event bus → C6` data flow
//! in §2.

use std::sync::Arc;

use alas_common::error::{PipelineError, PipelineResult};
use alas_common::models::{MobileEvent, OutEvent};
use alas_common::token::Token;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::AppState;

/// Constant-time byte comparison — a mismatching `x-hash` shouldn't leak
/// how many leading bytes it got right via timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/track", post(track))
}

#[derive(Serialize)]
struct TrackResponse {
    status: &'static str,
    token: String,
    ttl: i64,
}

const KIWI_EVENTS_TOPIC: &str = "kiwi-events";
const KEEP_ALIVE_TOPIC: &str = "keep-alive";

async fn track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> PipelineResult<Json<TrackResponse>> {
    // Step 1: decode the old token. An absent header reads as an empty
    // string, which `Token::decode` rejects the same way as any other
    // malformed input.
    let goblin_header = headers
        .get("x-goblin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let old_token =
        Token::decode(goblin_header, &state.config.token_secret).map_err(|_| PipelineError::BadToken)?;

    // Step 2: x-hash must be present.
    let signature = headers
        .get("x-hash")
        .and_then(|v| v.to_str().ok())
        .ok_or(PipelineError::NoHash)?;

    // Step 3: body was already read by the `Bytes` extractor; a body read
    // failure surfaces as an axum rejection before this handler runs, so
    // there's nothing further to check here.
    let body = body.to_vec();

    // Step 4: parse + schema-validate.
    let event = MobileEvent::parse(&body)?;

    // Step 5: constant-time hash comparison over body || session_id.
    let mut hasher = Sha256::new();
    hasher.update(&body);
    hasher.update(event.session_id.to_string().as_bytes());
    let computed = hex::encode(hasher.finalize());
    if !constant_time_eq(computed.as_bytes(), signature.as_bytes()) {
        return Err(PipelineError::HashMismatch);
    }

    // Step 6: source allow-list.
    if !state
        .config
        .allowed_sources
        .iter()
        .any(|s| s == &event.event_source)
    {
        return Err(PipelineError::SourceNotAllowed);
    }

    // Step 7: rotate.
    let now = chrono::Utc::now().timestamp();
    let mut conn = state.redis.clone();
    let (rotated_encoded, rotated_ttl) = alas_db::token_cache::rotate(&mut conn, old_token.session_id, now)
        .await
        .map_err(PipelineError::from)?
        .ok_or(PipelineError::NoFreshToken)?;

    // Step 8: override dominance.
    let out_event = OutEvent::build(event, &old_token, now);
    let payload = serde_json::to_vec(&out_event).expect("OutEvent always serializes");

    // Step 9: publish.
    state
        .bus
        .publish(KIWI_EVENTS_TOPIC, &payload)
        .await
        .map_err(|e| PipelineError::Internal(e.into()))?;
    state
        .bus
        .publish(KEEP_ALIVE_TOPIC, &payload)
        .await
        .map_err(|e| PipelineError::Internal(e.into()))?;

    tracing::info!(
        session_id = %out_event.session_id,
        event_name = %out_event.event_name,
        "forwarded track event"
    );

    // Step 10.
    Ok(Json(TrackResponse {
        status: "OK",
        token: rotated_encoded,
        ttl: rotated_ttl,
    }))
}
