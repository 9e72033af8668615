//! `GetTokenRequest` — the body of `POST /api/v1/getToken`
//! (`original_source/orcrist/events/get_token_request.go`).

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
pub struct GetTokenRequest {
    pub event_source: String,
    pub event_timestamp: String,
    pub session_id: Uuid,
    pub device_info: DeviceInfo,
}

impl GetTokenRequest {
    pub fn parse(body: &[u8]) -> Result<Self, PipelineError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| PipelineError::RequestMalformed)?;
        if !schema::is_valid(schema::get_token_request(), &value) {
            return Err(PipelineError::RequestMalformed);
        }
        serde_json::from_value(value).map_err(|_| PipelineError::RequestMalformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_scenario_one_body() {
        let body = serde_json::to_vec(&json!({
            "event_source": "mobile_app",
            "event_timestamp": "2024-01-01T00:00:00Z",
            "session_id": "550e8400-e29b-41d4-a716-446655440001",
            "device_info": {
                "device_id": "550e8400-e29b-41d4-a716-446655440002",
                "os": "iOS",
                "os_version": "15.4",
                "device_model": "iPhone 13",
                "device_manufacturer": "Apple"
            }
        }))
        .unwrap();
        let req = GetTokenRequest::parse(&body).unwrap();
        assert_eq!(req.event_source, "mobile_app");
    }

    #[test]
    fn rejects_scenario_four_body() {
        let body = serde_json::to_vec(&json!({ "field1": "value1", "field2": "value2" })).unwrap();
        assert!(matches!(
            GetTokenRequest::parse(&body),
            Err(PipelineError::RequestMalformed)
        ));
    }
}
