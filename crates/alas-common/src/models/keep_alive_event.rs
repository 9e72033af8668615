//! `KeepAliveEvent` — what C6 consumes from the `keep-alive` topic. It's
//! the same `OutEvent` shape C8 publishes; C6 only needs a handful of its
//! fields (`original_source/orcrist/handlers/keep_alive_handler.go`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mobile_event::DeviceInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepAliveEvent {
    pub event_name: String,
    pub event_type: String,
    pub event_source: String,
    pub event_timestamp: String,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub device_info: DeviceInfo,
    pub processed_at: i64,
}
