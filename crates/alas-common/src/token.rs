//! The opaque token codec (C1).
//!
//! Wire format: `base64std( IV[16] || AES-256-CTR_key( utf8(json(token)) ) )`.
//! CTR mode keeps ciphertext length equal to plaintext length and needs no
//! padding. There's deliberately no authentication tag — tamper detection
//! relies entirely on the decrypted plaintext parsing as JSON and matching
//! the token schema; any bit flip that doesn't yield a schema-conformant
//! document is rejected as `TokenError::Malformed`. This mirrors
//! `original_source/shared/token/token.go` exactly, including its one
//! safety net: decode-then-reencode and compare, so a payload that happens
//! to decrypt into some *other* valid-looking token is still caught if it
//! doesn't round-trip byte-for-byte.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::{rngs::OsRng, TryRngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

const IV_LEN: usize = 16;
pub const SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub session_id: Uuid,
    pub device_id: Uuid,
    pub expire_at: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("system randomness is unavailable: {0}")]
    Rng(#[from] rand::rand_core::OsError),
}

impl Token {
    pub fn new(session_id: Uuid, device_id: Uuid, expire_at: i64) -> Self {
        Self {
            session_id,
            device_id,
            expire_at,
        }
    }

    /// Encrypt and base64-encode this token under `secret` (a 32-byte AES-256 key).
    pub fn encode(&self, secret: &[u8; SECRET_LEN]) -> Result<String, TokenError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.try_fill_bytes(&mut iv)?;

        let plaintext = serde_json::to_vec(self).expect("Token always serializes");
        let mut buf = plaintext;
        let mut cipher = Aes256Ctr::new(secret.into(), &iv.into());
        cipher.apply_keystream(&mut buf);

        let mut out = Vec::with_capacity(IV_LEN + buf.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&buf);
        Ok(B64.encode(out))
    }

    /// Decode and decrypt `encoded` under `secret`, validating the recovered
    /// JSON against the token schema. An empty string fails the same way as
    /// any other malformed input — callers don't need to special-case "no
    /// header" versus "bad header".
    pub fn decode(encoded: &str, secret: &[u8; SECRET_LEN]) -> Result<Token, TokenError> {
        let raw = B64.decode(encoded).map_err(|_| TokenError::Malformed)?;
        if raw.len() <= IV_LEN {
            return Err(TokenError::Malformed);
        }

        let (iv, ciphertext) = raw.split_at(IV_LEN);
        let mut buf = ciphertext.to_vec();
        let mut cipher = Aes256Ctr::new(secret.into(), iv.into());
        cipher.apply_keystream(&mut buf);

        let value: serde_json::Value =
            serde_json::from_slice(&buf).map_err(|_| TokenError::Malformed)?;
        if !schema::is_valid(schema::token(), &value) {
            return Err(TokenError::Malformed);
        }

        let token: Token = serde_json::from_value(value.clone()).map_err(|_| TokenError::Malformed)?;

        // Round-trip guard: reject plaintext that parsed but carries extra
        // fields the schema let through (`additionalProperties` isn't set
        // to `false` anywhere). Comparing against the re-serialized token
        // catches what schema validation alone wouldn't.
        let canonical = serde_json::to_value(&token).expect("Token always serializes");
        if value != canonical {
            return Err(TokenError::Malformed);
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> [u8; SECRET_LEN] {
        [42u8; SECRET_LEN]
    }

    #[test]
    fn round_trip() {
        let t = Token::new(Uuid::new_v4(), Uuid::new_v4(), 1_700_000_000);
        let encoded = t.encode(&secret()).unwrap();
        let decoded = Token::decode(&encoded, &secret()).unwrap();
        assert_eq!(t, decoded);
    }

    #[test]
    fn empty_string_is_malformed() {
        assert!(matches!(
            Token::decode("", &secret()),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        assert!(matches!(
            Token::decode("not base64!!", &secret()),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn too_short_payload_is_malformed() {
        let short = B64.encode([0u8; IV_LEN]);
        assert!(matches!(
            Token::decode(&short, &secret()),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn tampered_ciphertext_is_malformed() {
        let t = Token::new(Uuid::new_v4(), Uuid::new_v4(), 1_700_000_000);
        let encoded = t.encode(&secret()).unwrap();
        let mut raw = B64.decode(&encoded).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let tampered = B64.encode(raw);
        assert!(Token::decode(&tampered, &secret()).is_err());
    }

    #[test]
    fn decoding_with_wrong_key_is_malformed() {
        let t = Token::new(Uuid::new_v4(), Uuid::new_v4(), 1_700_000_000);
        let encoded = t.encode(&secret()).unwrap();
        let wrong = [7u8; SECRET_LEN];
        assert!(Token::decode(&encoded, &wrong).is_err());
    }

    /// Hand-encrypt a token payload with an extra field the schema's
    /// `additionalProperties` doesn't forbid, to exercise the round-trip
    /// guard past schema validation.
    #[test]
    fn extra_field_in_payload_is_malformed() {
        let value = serde_json::json!({
            "session_id": Uuid::new_v4(),
            "device_id": Uuid::new_v4(),
            "expire_at": 1_700_000_000i64,
            "extra": "unexpected",
        });
        let plaintext = serde_json::to_vec(&value).unwrap();

        let mut iv = [0u8; IV_LEN];
        OsRng.try_fill_bytes(&mut iv).unwrap();
        let mut buf = plaintext;
        let mut cipher = Aes256Ctr::new(secret().as_ref().into(), iv.as_ref().into());
        cipher.apply_keystream(&mut buf);
        let mut out = Vec::with_capacity(IV_LEN + buf.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&buf);
        let encoded = B64.encode(out);

        assert!(matches!(
            Token::decode(&encoded, &secret()),
            Err(TokenError::Malformed)
        ));
    }
}
