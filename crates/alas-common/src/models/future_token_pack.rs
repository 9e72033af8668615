//! `FutureTokenPack` — the message C4 publishes to the `orc-tokens` topic
//! and C5 inserts into the token cache.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureToken {
    pub encoded: String,
    pub expire_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureTokenPack {
    pub session_id: Uuid,
    pub device_id: Uuid,
    pub tokens: Vec<FutureToken>,
}

impl FutureTokenPack {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
