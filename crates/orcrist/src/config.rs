//! Session authority configuration (`original_source/orcrist/config/config.go`).

use std::sync::OnceLock;

use alas_common::config::{decode_secret, load_dotenv, ConfigError, TOKEN_SECRET_LEN};
use serde::Deserialize;

static CONFIG: OnceLock<OrcristConfig> = OnceLock::new();

#[derive(Debug, Deserialize)]
struct RawConfig {
    http_port: u16,
    postgres_host: String,
    redis_host: String,
    kafka_host: String,
}

pub struct OrcristConfig {
    pub http_port: u16,
    pub postgres_host: String,
    pub redis_host: String,
    pub kafka_host: String,
    pub kafka_sync: bool,
    pub token_secret: [u8; TOKEN_SECRET_LEN],
}

pub fn init() -> Result<&'static OrcristConfig, ConfigError> {
    load_dotenv();

    let defaults: &[(&str, &str)] = &[
        ("http_port", "8081"),
        ("postgres_host", "postgres://localhost/orcrist"),
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

    let config = OrcristConfig {
        http_port: raw.http_port,
        postgres_host: raw.postgres_host,
        redis_host: raw.redis_host,
        kafka_host: raw.kafka_host,
        kafka_sync,
        token_secret,
    };

    Ok(CONFIG.get_or_init(|| config))
}
