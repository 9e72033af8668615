//! Session persistence (C3's session operations).

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub session_id: Uuid,
    pub device_id: Uuid,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Insert a brand-new session row. `session_id` is always freshly
/// generated by the caller — the authority owns session identity, never
/// a client-supplied id.
pub async fn create_session(
    tx: &mut Transaction<'_, Postgres>,
    session_id: Uuid,
    device_id: Uuid,
    duration_secs: i64,
) -> Result<Session, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "INSERT INTO sessions (session_id, device_id, inserted_at, updated_at, ends_at) \
         VALUES ($1, $2, now(), now(), now() + make_interval(secs => $3)) \
         RETURNING session_id, device_id, inserted_at, updated_at, ends_at",
    )
    .bind(session_id)
    .bind(device_id)
    .bind(duration_secs as f64)
    .fetch_one(&mut **tx)
    .await
}

/// A session row, only if it's still alive (`ends_at > now`).
pub async fn get_alive_session(
    pool: &PgPool,
    session_id: Uuid,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "SELECT session_id, device_id, inserted_at, updated_at, ends_at FROM sessions \
         WHERE session_id = $1 AND ends_at > now()",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
}

/// Prolong an existing session. Never creates one — a miss returns
/// `Ok(None)`, which callers must treat as "fall back to create_session".
pub async fn refresh_session(
    pool: &PgPool,
    session_id: Uuid,
    duration_secs: i64,
) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query_as::<_, Session>(
        "UPDATE sessions SET updated_at = now(), ends_at = now() + make_interval(secs => $2) \
         WHERE session_id = $1 \
         RETURNING session_id, device_id, inserted_at, updated_at, ends_at",
    )
    .bind(session_id)
    .bind(duration_secs as f64)
    .fetch_optional(pool)
    .await
}
