//! `OutEvent` — what C8 publishes onto the `kiwi-events`/`keep-alive`
//! topics (`original_source/kiwi/events/out_event.go`). The constructor
//! is the "override dominance" security property: the authority's token
//! always wins over whatever the client wrote into the request body.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::mobile_event::{AppInfo, DeviceInfo, Location, MobileEvent, NetworkInfo};
use crate::token::Token;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutEvent {
    pub event_name: String,
    pub event_type: String,
    pub event_source: String,
    pub event_timestamp: String,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub device_info: DeviceInfo,
    pub app_info: AppInfo,
    pub event_properties: serde_json::Value,
    pub location: Location,
    pub network_info: NetworkInfo,
    pub processed_at: i64,
}

impl OutEvent {
    /// Build the outbound event, overriding `session_id` and
    /// `device_info.device_id` with the values carried by `token` — never
    /// the request body's. `processed_at` is stamped with `now`.
    pub fn build(event: MobileEvent, token: &Token, now: i64) -> Self {
        let mut device_info = event.device_info;
        device_info.device_id = token.device_id;

        Self {
            event_name: event.event_name,
            event_type: event.event_type,
            event_source: event.event_source,
            event_timestamp: event.event_timestamp,
            user_id: event.user_id,
            session_id: token.session_id,
            device_info,
            app_info: event.app_info,
            event_properties: event.event_properties,
            location: event.location,
            network_info: event.network_info,
            processed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mobile_event::{AppInfo, Location, NetworkInfo};
    use serde_json::json;

    fn sample_event(session_id: Uuid, device_id: Uuid) -> MobileEvent {
        MobileEvent {
            event_name: "app_open".into(),
            event_type: "lifecycle".into(),
            event_source: "mobile_app".into(),
            event_timestamp: "2024-01-01T00:00:00Z".into(),
            user_id: Uuid::new_v4(),
            session_id,
            device_info: DeviceInfo {
                device_id,
                os: "iOS".into(),
                os_version: "15.4".into(),
                device_model: "iPhone 13".into(),
                device_manufacturer: "Apple".into(),
            },
            app_info: AppInfo {
                app_version: "1.0.0".into(),
                app_build_number: "42".into(),
                app_id: "com.example.app".into(),
            },
            event_properties: json!({ "screen": "home" }),
            location: Location { latitude: 0.0, longitude: 0.0 },
            network_info: NetworkInfo { connection_type: "wifi".into(), carrier: "none".into() },
        }
    }

    #[test]
    fn override_dominance() {
        let spoofed_session = Uuid::new_v4();
        let spoofed_device = Uuid::new_v4();
        let event = sample_event(spoofed_session, spoofed_device);

        let real_session = Uuid::new_v4();
        let real_device = Uuid::new_v4();
        let token = Token::new(real_session, real_device, 1_700_000_000);

        let out = OutEvent::build(event, &token, 1_700_000_100);

        assert_eq!(out.session_id, real_session);
        assert_eq!(out.device_info.device_id, real_device);
        assert_ne!(out.session_id, spoofed_session);
        assert_ne!(out.device_info.device_id, spoofed_device);
        assert_eq!(out.processed_at, 1_700_000_100);
    }
}
