//! Device persistence (C3's `get_or_create_device`).

use serde_json::Value;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Device {
    pub device_id: Uuid,
    pub external_device_id: Uuid,
    pub source: String,
    pub metadata: Value,
}

/// Find the device with the given client-declared id, or create it. The
/// `external_device_id` UNIQUE constraint is the arbiter for concurrent
/// callers racing to create the same device: the loser's `INSERT ...
/// ON CONFLICT DO NOTHING` returns no row, so it re-reads instead.
pub async fn get_or_create_device(
    tx: &mut Transaction<'_, Postgres>,
    external_device_id: Uuid,
    source: &str,
    metadata: Value,
) -> Result<Device, sqlx::Error> {
    if let Some(device) = sqlx::query_as::<_, Device>(
        "SELECT device_id, external_device_id, source, metadata FROM devices \
         WHERE external_device_id = $1",
    )
    .bind(external_device_id)
    .fetch_optional(&mut **tx)
    .await?
    {
        return Ok(device);
    }

    let inserted = sqlx::query_as::<_, Device>(
        "INSERT INTO devices (device_id, external_device_id, source, metadata) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (external_device_id) DO NOTHING \
         RETURNING device_id, external_device_id, source, metadata",
    )
    .bind(Uuid::new_v4())
    .bind(external_device_id)
    .bind(source)
    .bind(&metadata)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(device) = inserted {
        return Ok(device);
    }

    // Lost the race: the row now exists, re-read it.
    sqlx::query_as::<_, Device>(
        "SELECT device_id, external_device_id, source, metadata FROM devices \
         WHERE external_device_id = $1",
    )
    .bind(external_device_id)
    .fetch_one(&mut **tx)
    .await
}
