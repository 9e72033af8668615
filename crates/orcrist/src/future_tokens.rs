//! The future-token generator (C4), grounded in
//! `original_source/orcrist/handlers/future_tokens.go` with its named bug
//! fixed: `generate` returns the tokens it actually built, not an empty
//! `Vec` thrown away by the caller.

use alas_bus::Bus;
use alas_common::models::{FutureToken, FutureTokenPack};
use alas_common::token::Token;
use redis::aio::ConnectionManager;
use uuid::Uuid;

pub const SESSION_DURATION_SECS: i64 = 20 * 60;
const TOKEN_LIFETIME_SECS: i64 = 60;
const FUTURE_TOKENS_TOPIC: &str = "orc-tokens";

/// Mint successor tokens for `base` out to `now + session_duration`,
/// publish them as one pack, and advance the cache's horizon. Returns the
/// tokens actually generated (possibly empty, if the horizon already
/// covers the session window).
///
/// Failures are returned to the caller, who is expected to log and
/// continue — a refill failure must never fail the user request that
/// triggered it.
pub async fn generate_and_publish(
    bus: &Bus,
    redis: &mut ConnectionManager,
    secret: &[u8; alas_common::token::SECRET_LEN],
    base: Token,
    now: i64,
) -> anyhow::Result<Vec<Token>> {
    let horizon = alas_db::token_cache::get_horizon(redis, base.session_id, now).await?;

    let session_end = now + SESSION_DURATION_SECS;
    let time_to_cover = session_end - horizon;
    if time_to_cover <= 0 {
        return Ok(Vec::new());
    }

    let n = time_to_cover / TOKEN_LIFETIME_SECS;
    if n <= 0 {
        return Ok(Vec::new());
    }

    let tokens: Vec<Token> = (1..=n)
        .map(|i| Token::new(base.session_id, base.device_id, horizon + i * TOKEN_LIFETIME_SECS))
        .collect();

    let future_tokens: Vec<FutureToken> = tokens
        .iter()
        .map(|t| -> anyhow::Result<FutureToken> {
            Ok(FutureToken {
                encoded: t.encode(secret)?,
                expire_at: t.expire_at,
            })
        })
        .collect::<anyhow::Result<_>>()?;

    let pack = FutureTokenPack {
        session_id: base.session_id,
        device_id: base.device_id,
        tokens: future_tokens,
    };
    let payload = serde_json::to_vec(&pack)?;
    bus.publish(FUTURE_TOKENS_TOPIC, &payload).await?;

    let last_expire_at = tokens.last().expect("n > 0").expire_at;
    alas_db::token_cache::set_horizon(redis, base.session_id, last_expire_at, now).await?;

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_arithmetic_matches_spec_formula() {
        let now = 1_700_000_000_i64;
        let horizon = now;
        let session_end = now + SESSION_DURATION_SECS;
        let time_to_cover = session_end - horizon;
        let n = time_to_cover / TOKEN_LIFETIME_SECS;
        assert_eq!(n, 20);
    }

    #[test]
    fn horizon_at_or_past_session_end_yields_nothing() {
        let now = 1_700_000_000_i64;
        let horizon = now + SESSION_DURATION_SECS;
        let session_end = now + SESSION_DURATION_SECS;
        let time_to_cover = session_end - horizon;
        assert!(time_to_cover <= 0);
    }

    #[test]
    fn generated_ids_match_base_token() {
        let session_id = Uuid::new_v4();
        let device_id = Uuid::new_v4();
        let horizon = 1_700_000_000_i64;
        let tokens: Vec<Token> = (1..=3)
            .map(|i| Token::new(session_id, device_id, horizon + i * TOKEN_LIFETIME_SECS))
            .collect();
        assert!(tokens.iter().all(|t| t.session_id == session_id && t.device_id == device_id));
    }
}
