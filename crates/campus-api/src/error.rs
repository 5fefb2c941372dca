use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Top-level error type for the `campus-api` crate.
///
/// Covers every failure mode of the HTTP surface: transport, the
/// authorization stage, server-side validation, and payload decoding.
/// `campus-core` folds these into its user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The server rejected the bearer credential (HTTP 401).
    ///
    /// By the time a caller sees this, the [`AuthLayer`](crate::AuthLayer)
    /// has already notified its unauthorized handler.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // ── Request outcome ─────────────────────────────────────────────
    /// Client-side failure reported by the server (4xx other than 401/404),
    /// usually carrying field-level messages.
    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        fields: Vec<FieldError>,
    },

    /// The addressed resource does not exist (HTTP 404).
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Any other non-success response (5xx and friends).
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured base URL cannot carry path segments (e.g. `mailto:`).
    #[error("Base URL cannot be used for API requests: {0}")]
    UnusableBaseUrl(String),

    /// TLS setup or certificate loading error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The response envelope did not contain the expected payload key.
    #[error("Response is missing the '{key}' field")]
    MissingPayload { key: &'static str },
}

/// A single field-level message from a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl Error {
    /// Returns `true` if the server rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Build the error for a non-success response body.
    ///
    /// The backend answers failures as `{"message": "...", "errors": ...}`
    /// where `errors` is either a `{field: message}` object or a list of
    /// `{field|path|param, message|msg}` entries.
    pub(crate) fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("error")))
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body.chars().take(200).collect()
                }
            });

        match status.as_u16() {
            401 => Self::Unauthorized { message },
            404 => Self::NotFound { message },
            code @ 400..=499 => Self::Validation {
                status: code,
                fields: parsed
                    .as_ref()
                    .and_then(|v| v.get("errors"))
                    .map(parse_field_errors)
                    .unwrap_or_default(),
                message,
            },
            code => Self::Api {
                status: code,
                message,
            },
        }
    }
}

fn parse_field_errors(raw: &Value) -> Vec<FieldError> {
    match raw {
        Value::Object(map) => map
            .iter()
            .map(|(field, msg)| FieldError {
                field: field.clone(),
                message: match msg {
                    Value::String(s) => s.clone(),
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join("; "),
                    other => other.to_string(),
                },
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let field = ["field", "path", "param"]
                    .iter()
                    .find_map(|k| item.get(*k).and_then(Value::as_str))?;
                let message = ["message", "msg"]
                    .iter()
                    .find_map(|k| item.get(*k).and_then(Value::as_str))
                    .unwrap_or_default();
                Some(FieldError {
                    field: field.to_owned(),
                    message: message.to_owned(),
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}
