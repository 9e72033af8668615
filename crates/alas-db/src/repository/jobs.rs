//! Reaper bookkeeping: the `jobs(name, run_at)` marker table that makes
//! `remove_stale_sessions` crash-idempotent
//! (`original_source/orcrist/sessions/remove_stale_job.go`).

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

pub const STALE_SESSION_REAPER: &str = "remove_stale_sessions";

/// Claim the `(name, scheduled_at)` marker for this run. Returns `false`
/// if another reaper already claimed it (unique-constraint conflict) —
/// the caller should abort the run (the `SKIP` branch of the state
/// machine) rather than delete sessions twice.
pub async fn claim_job(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    scheduled_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO jobs (name, run_at) VALUES ($1, $2) ON CONFLICT (name, run_at) DO NOTHING",
    )
    .bind(name)
    .bind(scheduled_at)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Delete sessions whose `ends_at` is older than `scheduled_at - days`.
/// The cutoff is anchored to the job's scheduled time, not wall-clock
/// `now`, so a session prolonged after the job was scheduled but before
/// it ran is never swept up.
pub async fn remove_stale_sessions(
    tx: &mut Transaction<'_, Postgres>,
    scheduled_at: DateTime<Utc>,
    staleness_days: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM sessions WHERE ends_at < $1 - make_interval(days => $2)",
    )
    .bind(scheduled_at)
    .bind(staleness_days as f64)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected())
}

/// Garbage-collect marker rows at or before `scheduled_at`. Run outside
/// the delete's transaction, after commit, so a crash here never
/// re-triggers the delete (the marker for *this* run is already durable).
pub async fn remove_old_jobs(
    pool: &PgPool,
    name: &str,
    scheduled_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM jobs WHERE name = $1 AND run_at <= $2")
        .bind(name)
        .bind(scheduled_at)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
