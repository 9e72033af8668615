//! The stale-session reaper (C3's cleanup half), grounded in
//! `original_source/orcrist/sessions/remove_stale_job.go`. Runs forever:
//! wait until the next UTC midnight, try to claim that run's job marker,
//! delete sessions untouched for `STALENESS_DAYS`, then garbage-collect
//! old markers.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use alas_db::repository::jobs::{self, STALE_SESSION_REAPER};

const STALENESS_DAYS: i64 = 3;

pub async fn run(pool: PgPool, cancel: CancellationToken) {
    loop {
        let next_midnight = next_utc_midnight();
        let wait = (next_midnight - Utc::now()).to_std().unwrap_or(std::time::Duration::ZERO);

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("reaper shutting down");
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        if let Err(e) = run_once(&pool, next_midnight).await {
            tracing::error!(error = %e, "stale-session reaper run failed");
        }
    }
}

async fn run_once(pool: &PgPool, scheduled_at: DateTime<Utc>) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let claimed = jobs::claim_job(&mut tx, STALE_SESSION_REAPER, scheduled_at).await?;
    if !claimed {
        tracing::info!(%scheduled_at, "stale-session reaper already ran for this slot, skipping");
        return Ok(());
    }

    let removed = jobs::remove_stale_sessions(&mut tx, scheduled_at, STALENESS_DAYS).await?;
    tx.commit().await?;

    tracing::info!(removed, %scheduled_at, "removed stale sessions");

    let gced = jobs::remove_old_jobs(pool, STALE_SESSION_REAPER, scheduled_at).await?;
    tracing::debug!(gced, "garbage-collected old job markers");

    Ok(())
}

fn next_utc_midnight() -> DateTime<Utc> {
    let now = Utc::now();
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    if midnight > now {
        midnight
    } else {
        midnight + ChronoDuration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_midnight_is_always_in_the_future() {
        let midnight = next_utc_midnight();
        assert!(midnight > Utc::now());
    }
}
