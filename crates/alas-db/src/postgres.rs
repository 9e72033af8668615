//! Postgres connectivity helpers.

use sqlx::PgPool;

/// Verify the database is reachable. Used by readiness probes.
pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
