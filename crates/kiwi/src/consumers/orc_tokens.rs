//! The token-pack consumer (C5) — subscribes to `orc-tokens`, group
//! `ingestor`, and inserts each pack into the token cache
//! (`original_source/kiwi/handlers/orc_tokens_handler.go`).

use alas_bus::Bus;
use alas_common::models::FutureTokenPack;
use redis::aio::ConnectionManager;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const ORC_TOKENS_TOPIC: &str = "orc-tokens";
const CONSUMER_GROUP: &str = "ingestor";

pub fn spawn(
    bus: &Bus,
    kafka_host: &str,
    redis: ConnectionManager,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    bus.spawn_consumer(kafka_host, CONSUMER_GROUP, ORC_TOKENS_TOPIC, cancel, move |message| {
        let mut conn = redis.clone();
        tokio::spawn(async move {
            handle(&mut conn, &message).await;
        });
    })
}

async fn handle(conn: &mut ConnectionManager, message: &[u8]) {
    let pack: FutureTokenPack = match serde_json::from_slice(message) {
        Ok(pack) => pack,
        Err(e) => {
            tracing::warn!(error = %e, "dropping malformed token pack");
            return;
        }
    };

    if pack.is_empty() {
        tracing::warn!(session_id = %pack.session_id, "dropping empty token pack");
        return;
    }

    if let Err(e) = alas_db::token_cache::insert_pack(conn, &pack).await {
        tracing::error!(error = %e, session_id = %pack.session_id, "failed to store token pack");
        return;
    }

    tracing::debug!(session_id = %pack.session_id, count = pack.tokens.len(), "stored token pack");
}

#[cfg(test)]
mod tests {
    use super::*;
    use alas_common::models::FutureToken;
    use uuid::Uuid;

    #[test]
    fn empty_pack_detected() {
        let pack = FutureTokenPack {
            session_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            tokens: vec![],
        };
        assert!(pack.is_empty());
    }

    #[test]
    fn non_empty_pack_detected() {
        let pack = FutureTokenPack {
            session_id: Uuid::new_v4(),
            device_id: Uuid::new_v4(),
            tokens: vec![FutureToken { encoded: "x".into(), expire_at: 1 }],
        };
        assert!(!pack.is_empty());
    }
}
