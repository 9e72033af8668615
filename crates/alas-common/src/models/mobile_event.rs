//! `MobileEvent` — the body of `POST /api/v1/track`
//! (`original_source/kiwi/events/mobile_event.go`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::schema;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: Uuid,
    pub os: String,
    pub os_version: String,
    pub device_model: String,
    pub device_manufacturer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    pub app_version: String,
    pub app_build_number: String,
    pub app_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub connection_type: String,
    pub carrier: String,
}

/// `event_properties` is an arbitrary client-supplied JSON object. It is
/// modeled as an opaque tree and passed through verbatim — never
/// destructured — per the design note on dynamic payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobileEvent {
    pub event_name: String,
    pub event_type: String,
    pub event_source: String,
    pub event_timestamp: String,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub device_info: DeviceInfo,
    pub app_info: AppInfo,
    pub event_properties: Value,
    pub location: Location,
    pub network_info: NetworkInfo,
}

impl MobileEvent {
    /// Schema-validate `body` and deserialize it. Any failure — invalid
    /// JSON, a missing/mistyped required field — collapses to the single
    /// `EventMalformed` the client sees.
    pub fn parse(body: &[u8]) -> Result<Self, PipelineError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| PipelineError::EventMalformed)?;
        if !schema::is_valid(schema::mobile_event(), &value) {
            return Err(PipelineError::EventMalformed);
        }
        serde_json::from_value(value).map_err(|_| PipelineError::EventMalformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "event_name": "app_open",
            "event_type": "lifecycle",
            "event_source": "mobile_app",
            "event_timestamp": "2024-01-01T00:00:00Z",
            "user_id": "550e8400-e29b-41d4-a716-446655440003",
            "session_id": "550e8400-e29b-41d4-a716-446655440001",
            "device_info": {
                "device_id": "550e8400-e29b-41d4-a716-446655440002",
                "os": "iOS",
                "os_version": "15.4",
                "device_model": "iPhone 13",
                "device_manufacturer": "Apple"
            },
            "app_info": {
                "app_version": "1.0.0",
                "app_build_number": "42",
                "app_id": "com.example.app"
            },
            "event_properties": { "screen": "home" },
            "location": { "latitude": 50.45, "longitude": 30.52 },
            "network_info": { "connection_type": "wifi", "carrier": "none" }
        }))
        .unwrap()
    }

    #[test]
    fn parses_well_formed_event() {
        let event = MobileEvent::parse(&valid_body()).unwrap();
        assert_eq!(event.event_name, "app_open");
        assert_eq!(event.event_properties["screen"], "home");
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            MobileEvent::parse(b"not json"),
            Err(PipelineError::EventMalformed)
        ));
    }

    #[test]
    fn rejects_missing_required_field() {
        let mut value: Value = serde_json::from_slice(&valid_body()).unwrap();
        value.as_object_mut().unwrap().remove("session_id");
        let body = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            MobileEvent::parse(&body),
            Err(PipelineError::EventMalformed)
        ));
    }
}
