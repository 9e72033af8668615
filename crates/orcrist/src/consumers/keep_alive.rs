//! The keep-alive consumer (C6), grounded in
//! `original_source/orcrist/handlers/keep_alive_handler.go`. Prolongs the
//! session an event belongs to, then always refills the token pool —
//! even when prolongation was skipped, because the pool must stay full
//! regardless of how far ahead session state already is.

use alas_bus::Bus;
use alas_common::models::KeepAliveEvent;
use alas_common::token::Token;
use alas_db::Database;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::future_tokens;

const KEEP_ALIVE_TOPIC: &str = "keep-alive";
const CONSUMER_GROUP: &str = "session-authority";

pub fn spawn(
    bus: Bus,
    kafka_host: &str,
    db: Database,
    secret: [u8; alas_common::token::SECRET_LEN],
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let bus_for_spawn = bus.clone();
    bus_for_spawn.spawn_consumer(kafka_host, CONSUMER_GROUP, KEEP_ALIVE_TOPIC, cancel, move |message| {
        let bus = bus.clone();
        let db = db.clone();
        tokio::spawn(async move {
            handle(&bus, &db, &secret, &message).await;
        });
    })
}

async fn handle(bus: &Bus, db: &Database, secret: &[u8; alas_common::token::SECRET_LEN], message: &[u8]) {
    let event: KeepAliveEvent = match serde_json::from_slice(message) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed keep-alive event");
            return;
        }
    };

    let session = match alas_db::repository::sessions::get_alive_session(&db.pg, event.session_id).await {
        Ok(Some(session)) => Some(session),
        Ok(None) => {
            tracing::debug!(session_id = %event.session_id, "session not found, dropping keep-alive");
            None
        }
        Err(e) => {
            tracing::error!(error = %e, session_id = %event.session_id, "failed to query session");
            return;
        }
    };

    let Some(session) = session else { return };

    let processed_at = chrono::DateTime::from_timestamp(event.processed_at, 0)
        .unwrap_or_else(chrono::Utc::now);

    if session.ends_at < processed_at {
        if let Err(e) = alas_db::repository::sessions::refresh_session(
            &db.pg,
            event.session_id,
            future_tokens::SESSION_DURATION_SECS,
        )
        .await
        {
            tracing::error!(error = %e, session_id = %event.session_id, "failed to refresh session");
        }
    }

    let now = chrono::Utc::now().timestamp();
    let base = Token::new(event.session_id, event.device_info.device_id, event.processed_at);
    if let Err(e) =
        future_tokens::generate_and_publish(bus, &mut db.redis.clone(), secret, base, now).await
    {
        tracing::warn!(error = %e, session_id = %event.session_id, "failed to refill token pool");
    }
}
