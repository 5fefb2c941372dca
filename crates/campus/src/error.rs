//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use campus_config::ConfigError;
use campus_core::{CoreError, FieldError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the campus API at {url}")]
    #[diagnostic(
        code(campus::connection_failed),
        help(
            "Check that the API server is running and reachable.\n\
             Reason: {reason}\n\
             Override the URL with --api-url or set api_url in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(campus::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.\n{message}")
    )]
    Timeout { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not logged in to profile '{profile}'")]
    #[diagnostic(
        code(campus::not_authenticated),
        help("Run: campus login --profile {profile}")
    )]
    NotAuthenticated { profile: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(campus::auth_failed),
        help(
            "The server rejected the credential; the stored session was cleared.\n\
             Run: campus login --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("The stored credential is unreadable: {message}")]
    #[diagnostic(code(campus::bad_credential), help("Run: campus login"))]
    BadCredential { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {message}")]
    #[diagnostic(
        code(campus::not_found),
        help("List what exists with: campus <students|teachers|subjects|sections> list")
    )]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(code(campus::conflict))]
    Conflict { message: String },

    #[error("{message}")]
    #[diagnostic(code(campus::rejected), help("{details}"))]
    Rejected { message: String, details: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(campus::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(campus::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(campus::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: campus config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(campus::config))]
    Config(ConfigError),

    #[error("Credential storage failed: {message}")]
    #[diagnostic(
        code(campus::token_store),
        help("Set token_store = \"file\" in the profile if no system keyring is available.")
    )]
    TokenStore { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(campus::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(campus::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(campus::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotAuthenticated { .. } | Self::AuthFailed { .. } | Self::BadCredential { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the active profile name to errors whose help text needs it.
    pub fn for_profile(self, profile: &str) -> Self {
        match self {
            Self::NotAuthenticated { .. } => Self::NotAuthenticated {
                profile: profile.into(),
            },
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: profile.into(),
                message,
            },
            other => other,
        }
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },

            CoreError::Timeout { message } => Self::Timeout { message },

            CoreError::NotAuthenticated => Self::NotAuthenticated {
                profile: "default".into(),
            },

            CoreError::AuthenticationFailed { message } => Self::AuthFailed {
                profile: "default".into(),
                message,
            },

            CoreError::Decode(e) => Self::BadCredential {
                message: e.to_string(),
            },

            CoreError::ValidationFailed {
                message,
                status: 409,
                ..
            } => Self::Conflict { message },

            CoreError::ValidationFailed {
                message, fields, ..
            } => Self::Rejected {
                details: describe_fields(&fields),
                message,
            },

            CoreError::NotFound { message } => Self::NotFound { message },

            CoreError::Api { message, .. } => Self::ApiError { message },

            CoreError::TokenStore(e) => Self::TokenStore {
                message: e.to_string(),
            },

            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::TokenStore(e) => Self::TokenStore {
                message: e.to_string(),
            },
            other => Self::Config(other),
        }
    }
}
