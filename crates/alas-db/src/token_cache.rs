//! The ordered token cache (C2) — a per-session Redis sorted set of
//! encrypted future tokens scored by `expire_at`, grounded in
//! `original_source/kiwi/handlers/orc_tokens_handler.go` (`insert_pack`)
//! and `original_source/kiwi/handlers/track_handler.go::refreshToken`
//! (`rotate`). The sorted-set key is the session id itself — no prefix,
//! matching the Go original.
//!
//! `orcrist`'s future-token generator also keeps a "horizon" key here
//! (`orcrist:session_expiration:<session_id>`) tracking the last
//! `expire_at` it minted; see [`get_horizon`]/[`set_horizon`].

use alas_common::models::FutureTokenPack;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

const MIN_LEAD_SECS: i64 = 60;
const MAX_LEAD_SECS: i64 = 120;

fn horizon_key(session_id: Uuid) -> String {
    format!("orcrist:session_expiration:{session_id}")
}

/// Atomically add every token in `pack` to the session's ordered set and
/// bump the set's TTL to at least the pack's longest remaining lifetime,
/// never shrinking it ("expire-if-greater" semantics via Redis `EXPIRE
/// ... GT`). Idempotent: inserting the same `(expire_at, encoded)` member
/// twice is a no-op because sorted-set membership is by value.
pub async fn insert_pack(
    conn: &mut ConnectionManager,
    pack: &FutureTokenPack,
) -> Result<(), redis::RedisError> {
    if pack.is_empty() {
        return Ok(());
    }

    let key = pack.session_id.to_string();
    let members: Vec<(f64, &str)> = pack
        .tokens
        .iter()
        .map(|t| (t.expire_at as f64, t.encoded.as_str()))
        .collect();

    let max_expire_at = pack.tokens.iter().map(|t| t.expire_at).max().unwrap();
    let now = now_unix();
    let ttl_secs = (max_expire_at - now).max(1);

    let mut pipe = redis::pipe();
    pipe.atomic();
    pipe.zadd_multiple(&key, &members);
    pipe.cmd("EXPIRE").arg(&key).arg(ttl_secs).arg("GT");
    pipe.query_async::<()>(conn).await?;

    Ok(())
}

/// Return the smallest-scored member whose score falls in
/// `[now + 60, now + 120]`, along with `ttl = score - now`. `None` if the
/// window is empty.
pub async fn rotate(
    conn: &mut ConnectionManager,
    session_id: Uuid,
    now: i64,
) -> Result<Option<(String, i64)>, redis::RedisError> {
    let key = session_id.to_string();
    let min = now + MIN_LEAD_SECS;
    let max = now + MAX_LEAD_SECS;

    let results: Vec<(String, f64)> = conn
        .zrangebyscore_limit_withscores(&key, min, max, 0, 1)
        .await?;

    Ok(results.into_iter().next().map(|(encoded, score)| {
        let expire_at = score as i64;
        (encoded, expire_at - now)
    }))
}

/// The largest `expire_at` already minted for this session, or `now` if
/// nothing has been minted yet.
pub async fn get_horizon(
    conn: &mut ConnectionManager,
    session_id: Uuid,
    now: i64,
) -> Result<i64, redis::RedisError> {
    let value: Option<String> = conn.get(horizon_key(session_id)).await?;
    match value {
        Some(v) => Ok(v.parse().unwrap_or(now)),
        None => Ok(now),
    }
}

/// Record `expire_at` as the new horizon. The key's own TTL is the
/// remaining lifetime of that token, not its absolute timestamp — using
/// the absolute unix timestamp as a TTL-in-seconds (as the Go original
/// does) would set a multi-decade expiry.
pub async fn set_horizon(
    conn: &mut ConnectionManager,
    session_id: Uuid,
    expire_at: i64,
    now: i64,
) -> Result<(), redis::RedisError> {
    let ttl_secs = (expire_at - now).max(1) as u64;
    conn.set_ex(horizon_key(session_id), expire_at.to_string(), ttl_secs)
        .await
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
