//! Configuration helpers shared by `kiwi` and `orcrist`.
//!
//! Each binary owns its own `AppConfig` (the two services read different
//! env vars — only `orcrist` needs `POSTGRES_HOST`, only `kiwi` needs
//! `ALLOWED_SOURCES`), but both load it the same way: a `.env` file for
//! local development via `dotenvy`, flat environment variables for
//! production, no nested prefix. This module holds the bits that are
//! identical across both: loading `.env`, and decoding the shared
//! `TOKEN_SECRET` into AES-256 key bytes.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

/// Byte length of an AES-256 key.
pub const TOKEN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("TOKEN_SECRET is not valid base64: {0}")]
    SecretNotBase64(base64::DecodeError),

    #[error("TOKEN_SECRET must decode to {TOKEN_SECRET_LEN} bytes, got {0}")]
    SecretWrongLength(usize),
}

/// Load a `.env` file if present. Safe to call once at startup; a missing
/// file is not an error — production deployments set real env vars.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// `KAFKA_SYNC=1` (or `true`) forces synchronous bus writes; anything
/// else, including an unset variable, means asynchronous. Read directly
/// rather than through the `config` crate's typed deserialization,
/// since its env-var bool parsing doesn't accept `"1"`.
pub fn kafka_sync_from_env() -> bool {
    match std::env::var("KAFKA_SYNC") {
        Ok(v) => v == "1" || v.eq_ignore_ascii_case("true"),
        Err(_) => false,
    }
}

/// Decode `TOKEN_SECRET` (base64) into a 32-byte AES-256 key.
pub fn decode_secret(value: &str) -> Result<[u8; TOKEN_SECRET_LEN], ConfigError> {
    let bytes = B64.decode(value).map_err(ConfigError::SecretNotBase64)?;
    bytes
        .try_into()
        .map_err(|v: Vec<u8>| ConfigError::SecretWrongLength(v.len()))
}

/// Base builder shared by both services: flat (unprefixed) environment
/// variables layered over the given defaults, no config file.
pub fn builder_with_defaults(
    defaults: &[(&str, &str)],
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    let mut builder = config::Config::builder();
    for (key, value) in defaults {
        builder = builder.set_default(*key, *value)?;
    }
    Ok(builder.add_source(config::Environment::default().try_parsing(true)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_secret_roundtrip() {
        let key = [7u8; TOKEN_SECRET_LEN];
        let encoded = B64.encode(key);
        assert_eq!(decode_secret(&encoded).unwrap(), key);
    }

    #[test]
    fn decode_secret_rejects_wrong_length() {
        let encoded = B64.encode([1u8; 16]);
        assert!(matches!(
            decode_secret(&encoded),
            Err(ConfigError::SecretWrongLength(16))
        ));
    }

    #[test]
    fn decode_secret_rejects_bad_base64() {
        assert!(matches!(
            decode_secret("not base64!!"),
            Err(ConfigError::SecretNotBase64(_))
        ));
    }
}
