//! Compiled JSON schemas for the three wire payloads (`Token`, `MobileEvent`,
//! `GetTokenRequest`). Compiled once, lazily, the way the Go original
//! compiles them at startup via `go:embed` + `jsonschema.Compiler`
//! (`original_source/shared/schemas/schemas.go`,
//! `original_source/kiwi/schemas/schemas.go`) — here via `include_str!` and
//! a `OnceLock` per schema, mirroring the teacher's global-init idiom
//! (`nexus_common::config::CONFIG`) applied to a value that isn't config.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

fn compile(source: &str) -> Validator {
    let schema: Value = serde_json::from_str(source).expect("embedded schema is valid JSON");
    jsonschema::validator_for(&schema).expect("embedded schema is a valid JSON Schema")
}

static TOKEN: OnceLock<Validator> = OnceLock::new();
static MOBILE_EVENT: OnceLock<Validator> = OnceLock::new();
static GET_TOKEN_REQUEST: OnceLock<Validator> = OnceLock::new();

/// Schema for the decrypted token payload: `session_id`, `device_id`, `expire_at`.
pub fn token() -> &'static Validator {
    TOKEN.get_or_init(|| compile(include_str!("../schemas/token.json")))
}

/// Schema for the `MobileEvent` body accepted by the track endpoint.
pub fn mobile_event() -> &'static Validator {
    MOBILE_EVENT.get_or_init(|| compile(include_str!("../schemas/mobile_event.json")))
}

/// Schema for the `GetTokenRequest` body accepted by the issue endpoint.
pub fn get_token_request() -> &'static Validator {
    GET_TOKEN_REQUEST.get_or_init(|| compile(include_str!("../schemas/get_token_request.json")))
}

/// True if `instance` conforms to `validator`. A thin name for
/// `Validator::is_valid` so call sites read `schema::is_valid(schema::token(), &v)`.
pub fn is_valid(validator: &Validator, instance: &Value) -> bool {
    validator.is_valid(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_schema_accepts_well_formed_payload() {
        let v = json!({
            "session_id": "550e8400-e29b-41d4-a716-446655440000",
            "device_id": "550e8400-e29b-41d4-a716-446655440001",
            "expire_at": 1_700_000_000i64
        });
        assert!(is_valid(token(), &v));
    }

    #[test]
    fn token_schema_rejects_missing_field() {
        let v = json!({
            "session_id": "550e8400-e29b-41d4-a716-446655440000",
            "expire_at": 1_700_000_000i64
        });
        assert!(!is_valid(token(), &v));
    }

    #[test]
    fn token_schema_rejects_non_uuid_session_id() {
        let v = json!({
            "session_id": "not-a-uuid",
            "device_id": "550e8400-e29b-41d4-a716-446655440001",
            "expire_at": 1_700_000_000i64
        });
        assert!(!is_valid(token(), &v));
    }

    #[test]
    fn token_schema_rejects_wrong_type() {
        let v = json!({
            "session_id": "550e8400-e29b-41d4-a716-446655440000",
            "device_id": "550e8400-e29b-41d4-a716-446655440001",
            "expire_at": "soon"
        });
        assert!(!is_valid(token(), &v));
    }

    #[test]
    fn get_token_request_schema_accepts_scenario_one_body() {
        let v = json!({
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
        });
        assert!(is_valid(get_token_request(), &v));
    }

    #[test]
    fn get_token_request_schema_rejects_scenario_four_body() {
        let v = json!({ "field1": "value1", "field2": "value2" });
        assert!(!is_valid(get_token_request(), &v));
    }
}
