//! Ingestor configuration (`original_source/kiwi/config/config.go` +
//! `original_source/kiwi/app/config.go`).

use std::sync::OnceLock;

use alas_common::config::{decode_secret, load_dotenv, ConfigError, TOKEN_SECRET_LEN};
use serde::Deserialize;

static CONFIG: OnceLock<KiwiConfig> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct RawConfig {
    http_port: u16,
    redis_host: String,
    kafka_host: String,
}

pub struct KiwiConfig {
    pub http_port: u16,
    pub redis_host: String,
    pub kafka_host: String,
    pub kafka_sync: bool,
    pub token_secret: [u8; TOKEN_SECRET_LEN],
    pub allowed_sources: Vec<String>,
}

pub fn init() -> Result<&'static KiwiConfig, ConfigError> {
    load_dotenv();

    let defaults: &[(&str, &str)] = &[
        ("http_port", "8080"),
        ("redis_host", "localhost"),
        ("kafka_host", "localhost"),
    ];
    let raw: RawConfig = alas_common::config::builder_with_defaults(defaults)?
        .build()?
        .try_deserialize()?;
    let kafka_sync = alas_common::config::kafka_sync_from_env();

    let token_secret_b64 = std::env::var("TOKEN_SECRET")
        .expect("TOKEN_SECRET must be set (base64-encoded 32-byte AES-256 key)");
    let token_secret = decode_secret(&token_secret_b64)?;

    let allowed_sources_raw = std::env::var("ALLOWED_SOURCES")
        .expect("ALLOWED_SOURCES must be set (JSON array of strings)");
    let allowed_sources: Vec<String> = serde_json::from_str(&allowed_sources_raw)
        .expect("ALLOWED_SOURCES must be a JSON array of strings");

    let config = KiwiConfig {
        http_port: raw.http_port,
        redis_host: raw.redis_host,
        kafka_host: raw.kafka_host,
        kafka_sync,
        token_secret,
        allowed_sources,
    };

    Ok(CONFIG.get_or_init(|| config))
}
