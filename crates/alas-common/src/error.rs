//! Shared error taxonomy for `kiwi` and `orcrist`.
//!
//! Both endpoints answer with HTTP 200 always and signal failure in the
//! body — `{"status":"OK",...}` or `{"status":"ERROR","message":"..."}` —
//! so there is no `status_code()` to compute here, unlike a conventional
//! REST error type. What's shared is the envelope and the message text,
//! which is part of the wire contract and must match exactly.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error kinds surfaced by the track and issue endpoints, plus the
/// internal-only `SessionNotFound` raised by the keep-alive consumer
/// (which never reaches a client — it's only ever logged).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Orc token is invalid")]
    BadToken,

    #[error("x-hash header is not set")]
    NoHash,

    #[error("Computed hash did not match")]
    HashMismatch,

    #[error("Failed to read request")]
    ReadError,

    #[error("Request is malformed")]
    RequestMalformed,

    #[error("Event is malformed")]
    EventMalformed,

    #[error("Event source is not allowed")]
    SourceNotAllowed,

    #[error("No fresh token available")]
    NoFreshToken,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),
}

impl PipelineError {
    /// The exact string clients see in `{"status":"ERROR","message":...}`.
    /// Infra failures are collapsed to a generic message — their detail
    /// goes to the log, never the response body.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::BadToken => "Orc token is invalid",
            Self::NoHash => "x-hash header is not set",
            Self::HashMismatch => "Computed hash did not match",
            Self::ReadError => "Failed to read request",
            Self::RequestMalformed | Self::EventMalformed => "Request is malformed",
            Self::SourceNotAllowed => "Event source is not allowed",
            Self::NoFreshToken => "No fresh token available",
            Self::SessionNotFound | Self::Internal(_) | Self::Database(_) | Self::Cache(_) => {
                "Internal error"
            }
        }
    }

    fn log_if_internal(&self) {
        match self {
            Self::Database(e) => tracing::error!(error = %e, "database error"),
            Self::Cache(e) => tracing::error!(error = %e, "cache error"),
            Self::Internal(e) => tracing::error!(error = %e, "internal error"),
            Self::SessionNotFound => tracing::warn!("session not found"),
            _ => {}
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: &'static str,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        self.log_if_internal();
        let body = ErrorBody {
            status: "ERROR",
            message: self.client_message(),
        };
        Json(body).into_response()
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_matches_wire_contract() {
        assert_eq!(PipelineError::BadToken.client_message(), "Orc token is invalid");
        assert_eq!(PipelineError::NoHash.client_message(), "x-hash header is not set");
        assert_eq!(
            PipelineError::HashMismatch.client_message(),
            "Computed hash did not match"
        );
        assert_eq!(PipelineError::RequestMalformed.client_message(), "Request is malformed");
        assert_eq!(PipelineError::EventMalformed.client_message(), "Request is malformed");
    }

    #[test]
    fn infra_errors_never_leak_detail() {
        let err = PipelineError::Internal(anyhow::anyhow!("leaked secret detail"));
        assert_eq!(err.client_message(), "Internal error");
    }
}
