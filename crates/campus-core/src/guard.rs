// ── Session guard ──
//
// Supervises credential validity independently of any request. Mounting
// runs one synchronous check and starts a fixed-period re-check task;
// the task is the only thing in the crate that ever needs cancelling.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::CoreError;
use crate::session::{self, Session};
use crate::store::AppStore;
use crate::token::{TokenStore, TokenStoreError};

/// Authentication state published through the [`AppStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    /// Before the first check has run.
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Loading | Self::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// What a guarded region should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    /// Neutral placeholder while the first check resolves.
    Placeholder,
    /// Render the protected content for this session.
    Render(Session),
    /// Go to the login entry point, remembering where the user was headed.
    RedirectToLogin { login: String, from: String },
}

// ── AuthGuard ────────────────────────────────────────────────────────

/// Owns the Loading / Authenticated / Unauthenticated state machine.
///
/// Cheaply cloneable; every clone drives the same state.
#[derive(Clone)]
pub struct AuthGuard {
    inner: Arc<GuardInner>,
}

struct GuardInner {
    store: Arc<AppStore>,
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    period: Duration,
    login_route: String,
    supervision: Mutex<Supervision>,
}

/// Mount bookkeeping, kept apart from the task so a logout can stop the
/// check while the mount stays live.
#[derive(Default)]
struct Supervision {
    /// Id of the live `GuardMount`, if any.
    mounted: Option<u64>,
    last_mount: u64,
    /// Cancellation handle of the running periodic check.
    task: Option<CancellationToken>,
}

impl AuthGuard {
    pub fn new(
        store: Arc<AppStore>,
        tokens: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        period: Duration,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(GuardInner {
                store,
                tokens,
                clock,
                period,
                login_route: login_route.into(),
                supervision: Mutex::new(Supervision::default()),
            }),
        }
    }

    pub fn state(&self) -> AuthState {
        self.inner.store.auth_state()
    }

    pub fn session(&self) -> Option<Session> {
        self.state().session().cloned()
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Run the initial check and start the periodic re-check.
    ///
    /// Must be called inside a Tokio runtime. Re-mounting replaces the
    /// previous mount and its periodic task.
    pub fn mount(&self) -> GuardMount {
        self.check(true);

        let mut supervision = self.supervision();
        if let Some(previous) = supervision.task.take() {
            previous.cancel();
        }
        supervision.last_mount += 1;
        let id = supervision.last_mount;
        supervision.mounted = Some(id);
        supervision.task = Some(self.spawn_supervision());
        drop(supervision);
        debug!(period_secs = self.inner.period.as_secs(), "session guard mounted");

        GuardMount {
            guard: self.clone(),
            id,
        }
    }

    fn spawn_supervision(&self) -> CancellationToken {
        let cancel = CancellationToken::new();
        let guard = self.clone();
        let token = cancel.clone();
        tokio::spawn(async move { guard.supervise(token).await });
        cancel
    }

    /// Restart the periodic check after a logout stopped it, as long as a
    /// mount is still live.
    fn resume_supervision(&self) {
        let mut supervision = self.supervision();
        if supervision.mounted.is_some() && supervision.task.is_none() {
            supervision.task = Some(self.spawn_supervision());
            debug!("session supervision resumed");
        }
    }

    fn release(&self, id: u64) {
        let mut supervision = self.supervision();
        if supervision.mounted != Some(id) {
            return;
        }
        supervision.mounted = None;
        if let Some(cancel) = supervision.task.take() {
            cancel.cancel();
        }
    }

    async fn supervise(self, cancel: CancellationToken) {
        let period = self.inner.period;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => self.check(false),
            }
        }
        debug!("session supervision stopped");
    }

    /// One validity check.
    ///
    /// On mount any unusable credential is discarded. On periodic ticks
    /// an expiry while authenticated clears the store and logs out.
    fn check(&self, initial: bool) {
        let was_authenticated = self.state().is_authenticated();

        if let Some(session) = self.stored_session() {
            self.inner.store.set_auth(AuthState::Authenticated(session));
            return;
        }

        if initial || was_authenticated {
            self.discard_credential();
        }
        if self.inner.store.set_auth(AuthState::Unauthenticated) && was_authenticated {
            info!("session expired, logged out");
        }
    }

    /// The stored credential's session, if it exists and is still live.
    fn stored_session(&self) -> Option<Session> {
        let token = match self.inner.tokens.get() {
            Ok(token) => token?,
            Err(e) => {
                warn!(error = %e, "cannot read stored credential");
                return None;
            }
        };
        let now = self.inner.clock.now();
        match session::decode(token.expose_secret()) {
            Ok(session) if session.is_live_at(now) => Some(session),
            Ok(session) => {
                debug!(expired_at = %session.expires_at, "stored credential expired");
                None
            }
            Err(e) => {
                debug!(error = %e, "stored credential unreadable");
                None
            }
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Store a freshly issued credential and become authenticated.
    pub fn accept_credential(&self, token: &SecretString) -> Result<Session, CoreError> {
        let session = match session::decode(token.expose_secret()) {
            Ok(session) => session,
            Err(e) => {
                self.inner.store.set_auth(AuthState::Unauthenticated);
                return Err(e.into());
            }
        };
        if !session.is_live_at(self.inner.clock.now()) {
            self.inner.store.set_auth(AuthState::Unauthenticated);
            return Err(CoreError::AuthenticationFailed {
                message: "the server issued an already expired credential".into(),
            });
        }

        self.inner.tokens.set(token)?;
        info!(subject = %session.subject_id, "logged in");
        self.inner
            .store
            .set_auth(AuthState::Authenticated(session.clone()));
        self.resume_supervision();
        Ok(session)
    }

    /// Clear the credential, stop supervision and become unauthenticated.
    ///
    /// The transition always happens; the result only reports whether the
    /// credential could be removed from storage.
    pub fn logout(&self) -> Result<(), TokenStoreError> {
        if let Some(cancel) = self.supervision().task.take() {
            cancel.cancel();
        }
        let cleared = self.inner.tokens.clear();
        if self.inner.store.set_auth(AuthState::Unauthenticated) {
            info!("logged out");
        }
        cleared
    }

    /// Logout triggered by the server rejecting the credential.
    pub fn force_logout(&self) {
        warn!("credential rejected by the server");
        if let Err(e) = self.logout() {
            warn!(error = %e, "cannot clear stored credential");
        }
    }

    // ── Guarded regions ──────────────────────────────────────────────

    /// Decide what a guarded region at `requested` should show.
    pub fn view(&self, requested: &str) -> GuardView {
        match self.state() {
            AuthState::Loading => GuardView::Placeholder,
            AuthState::Authenticated(session) => GuardView::Render(session),
            AuthState::Unauthenticated => GuardView::RedirectToLogin {
                login: self.inner.login_route.clone(),
                from: requested.to_owned(),
            },
        }
    }

    fn discard_credential(&self) {
        if let Err(e) = self.inner.tokens.clear() {
            warn!(error = %e, "cannot clear stored credential");
        }
    }

    fn supervision(&self) -> std::sync::MutexGuard<'_, Supervision> {
        self.inner
            .supervision
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl campus_api::UnauthorizedHandler for AuthGuard {
    fn on_unauthorized(&self) {
        self.force_logout();
    }
}

/// Keeps the periodic check alive; dropping it stops the check.
///
/// While the handle lives, a login after a logout restarts the check.
#[must_use = "dropping the mount handle stops the periodic session check"]
pub struct GuardMount {
    guard: AuthGuard,
    id: u64,
}

impl GuardMount {
    /// Stop the periodic check.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for GuardMount {
    fn drop(&mut self) {
        self.guard.release(self.id);
    }
}
