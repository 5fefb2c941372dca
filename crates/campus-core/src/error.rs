// ── Core error types ──
//
// User-facing errors from campus-core. Consumers classify failures by
// `ErrorKind` rather than HTTP status; the `From<campus_api::Error>` impl
// folds transport-layer failures into that taxonomy.

use campus_api::FieldError;
use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::session::DecodeError;
use crate::token::TokenStoreError;

/// Coarse failure classification shared by slices, the guard and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response was received.
    NetworkFailure,
    /// The credential was rejected or is missing.
    AuthFailure,
    /// The server refused the input (4xx with field messages).
    ValidationFailure,
    NotFound,
    /// The stored credential could not be decoded.
    DecodeError,
    /// Configuration, storage and unexpected server failures.
    Other,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Network ──────────────────────────────────────────────────────
    #[error("Cannot reach the API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Invalid credential: {0}")]
    Decode(#[from] DecodeError),

    // ── Request outcome ──────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed {
        message: String,
        fields: Vec<FieldError>,
        /// HTTP status the server answered with (400, 409, 422, ...).
        status: u16,
    },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Token store error: {0}")]
    TokenStore(#[from] TokenStoreError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => ErrorKind::NetworkFailure,
            Self::AuthenticationFailed { .. } | Self::NotAuthenticated => ErrorKind::AuthFailure,
            Self::Decode(_) => ErrorKind::DecodeError,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailure,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Api { .. }
            | Self::TokenStore(_)
            | Self::Config { .. }
            | Self::Internal(_) => ErrorKind::Other,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.kind() == ErrorKind::AuthFailure
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<campus_api::Error> for CoreError {
    fn from(err: campus_api::Error) -> Self {
        match err {
            campus_api::Error::Unauthorized { message } => {
                CoreError::AuthenticationFailed { message }
            }
            campus_api::Error::Validation {
                status,
                message,
                fields,
            } => CoreError::ValidationFailed {
                message,
                fields,
                status,
            },
            campus_api::Error::NotFound { message } => CoreError::NotFound { message },
            campus_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            campus_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout {
                        message: e.to_string(),
                    }
                } else if e.is_connect() || e.is_request() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            campus_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            campus_api::Error::UnusableBaseUrl(url) => CoreError::Config {
                message: format!("Base URL cannot carry API paths: {url}"),
            },
            campus_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            campus_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected response: {message}"))
            }
            campus_api::Error::MissingPayload { key } => {
                CoreError::Internal(format!("Response is missing the '{key}' field"))
            }
        }
    }
}

// ── Slice errors ─────────────────────────────────────────────────────

/// The error recorded on a resource slice after a rejected request.
///
/// `message` is the server's own text for validation failures, the
/// rendered error otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl From<&CoreError> for SliceError {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::ValidationFailed {
                message, fields, ..
            } => Self {
                kind: ErrorKind::ValidationFailure,
                message: message.clone(),
                fields: fields.clone(),
            },
            other => Self {
                kind: other.kind(),
                message: other.to_string(),
                fields: Vec::new(),
            },
        }
    }
}
