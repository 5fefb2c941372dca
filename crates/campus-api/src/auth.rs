// Authorization stage and the authentication endpoints.
//
// Every outgoing request passes through `AuthLayer`: the request side
// attaches the current bearer credential, the response side turns an
// HTTP 401 into a forced-logout notification before the error reaches
// the caller. Login and register live here too since they produce the
// credential the layer later attaches.

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::EntityId;

// ── Seams ───────────────────────────────────────────────────────────

/// Supplies the bearer credential for outgoing requests.
///
/// Read once per request, at send time.
pub trait CredentialSource: Send + Sync {
    fn bearer(&self) -> Option<SecretString>;
}

/// Notified whenever the server answers HTTP 401, regardless of which
/// resource issued the call.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

impl<F> UnauthorizedHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_unauthorized(&self) {
        self();
    }
}

/// A source that never has a credential (public endpoints only).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn bearer(&self) -> Option<SecretString> {
        None
    }
}

/// A fixed credential, for scripts and tests that already hold a token.
#[derive(Clone)]
pub struct StaticCredential(pub SecretString);

impl CredentialSource for StaticCredential {
    fn bearer(&self) -> Option<SecretString> {
        Some(self.0.clone())
    }
}

// ── AuthLayer ───────────────────────────────────────────────────────

/// Request/response stage wrapped around every API call.
#[derive(Clone)]
pub struct AuthLayer {
    credentials: Arc<dyn CredentialSource>,
    on_unauthorized: Arc<dyn UnauthorizedHandler>,
}

impl AuthLayer {
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        on_unauthorized: Arc<dyn UnauthorizedHandler>,
    ) -> Self {
        Self {
            credentials,
            on_unauthorized,
        }
    }

    /// A layer with no credential and a no-op unauthorized handler.
    pub fn anonymous() -> Self {
        Self::new(Arc::new(NoCredentials), Arc::new(|| {}))
    }

    /// Request side: attach `Authorization: Bearer <token>` if a credential exists.
    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Response side: a 401 notifies the handler and short-circuits.
    pub(crate) fn inspect(&self, status: StatusCode, body: &str) -> Result<(), Error> {
        if status != StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        warn!("server rejected the credential, forcing logout");
        self.on_unauthorized.on_unauthorized();
        Err(Error::from_response(status, body))
    }
}

impl fmt::Debug for AuthLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthLayer").finish_non_exhaustive()
    }
}

// ── Auth endpoints ──────────────────────────────────────────────────

/// The user record returned alongside a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Response of the login and register endpoints.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub message: String,
    pub token: SecretString,
    pub user: Option<AuthUser>,
}

#[derive(Deserialize)]
struct RawAuthResponse {
    #[serde(default)]
    message: String,
    token: String,
    #[serde(default)]
    user: Option<AuthUser>,
}

impl From<RawAuthResponse> for AuthResponse {
    fn from(raw: RawAuthResponse) -> Self {
        Self {
            message: raw.message,
            token: SecretString::from(raw.token),
            user: raw.user,
        }
    }
}

impl ApiClient {
    /// Exchange email + password for a bearer credential.
    ///
    /// `POST /authentication/login`
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse, Error> {
        debug!(%email, "logging in");
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
        });
        self.authenticate(&["authentication", "login"], &body).await
    }

    /// Create an account and receive its first credential.
    ///
    /// `POST /authentication/register`
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<AuthResponse, Error> {
        debug!(%email, "registering account");
        let body = json!({
            "name": name,
            "email": email,
            "password": password.expose_secret(),
        });
        self.authenticate(&["authentication", "register"], &body).await
    }

    async fn authenticate(
        &self,
        segments: &[&str],
        body: &serde_json::Value,
    ) -> Result<AuthResponse, Error> {
        let builder = self.request(Method::POST, segments)?.json(body);
        let raw: RawAuthResponse = self.execute(builder).await?.into_inner()?;
        Ok(raw.into())
    }
}
