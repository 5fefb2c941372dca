// ── Runtime client configuration ──
//
// Describes *how* to reach the campus API and how often to re-check the
// session. Never touches disk: the CLI (via campus-config) builds a
// `ClientConfig` and hands it in.

use std::time::Duration;

use campus_api::{TlsMode, TransportConfig};
use url::Url;

/// Default interval between session validity checks.
pub const DEFAULT_SESSION_CHECK: Duration = Duration::from_secs(60);

/// Default login entry point for unauthenticated redirects.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:3000`.
    pub api_url: Url,
    pub tls: TlsMode,
    /// Per-request timeout enforced by the HTTP transport.
    pub timeout: Duration,
    /// Period of the guard's validity re-check while mounted.
    pub session_check_interval: Duration,
    /// Where unauthenticated visitors are sent.
    pub login_route: String,
}

impl ClientConfig {
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            session_check_interval: DEFAULT_SESSION_CHECK,
            login_route: DEFAULT_LOGIN_ROUTE.into(),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }
}
