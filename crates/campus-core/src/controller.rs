// ── Controller facade ──
//
// Wires the token store, session guard, application store and API client
// together, and runs every resource request through its slice's
// pending -> fulfilled | rejected transitions.

use std::future::Future;
use std::sync::Arc;

use campus_api::{
    ApiClient, AssignmentInput, AuthLayer, EntityId, ListQuery, Listing, Resource,
    ResourceClient, Section, Student, Subject, Teacher,
};
use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::{CoreError, SliceError};
use crate::guard::{AuthGuard, AuthState, GuardMount, GuardView};
use crate::session::Session;
use crate::store::{AppStore, Mutation, ResourceState, Slice};
use crate::stream::SliceStream;
use crate::token::{StoredCredential, TokenStore};

// ── Controller ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ClientConfig,
    store: Arc<AppStore>,
    guard: AuthGuard,
    api: ApiClient,
}

impl Controller {
    /// Build a controller around `tokens`. Nothing is checked or fetched
    /// until [`mount_guard()`](Self::mount_guard) or a resource call.
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        Self::with_clock(config, tokens, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ClientConfig,
        tokens: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        let store = Arc::new(AppStore::new());
        let guard = AuthGuard::new(
            Arc::clone(&store),
            Arc::clone(&tokens),
            clock,
            config.session_check_interval,
            config.login_route.clone(),
        );
        let auth = AuthLayer::new(
            Arc::new(StoredCredential(tokens)),
            Arc::new(guard.clone()),
        );
        let api = ApiClient::new(config.api_url.clone(), &config.transport(), auth)?;

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                guard,
                api,
            }),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<AppStore> {
        &self.inner.store
    }

    pub fn guard(&self) -> &AuthGuard {
        &self.inner.guard
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Check the stored credential and start periodic supervision.
    pub fn mount_guard(&self) -> GuardMount {
        self.inner.guard.mount()
    }

    pub fn auth_state(&self) -> AuthState {
        self.inner.guard.state()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.guard.session()
    }

    /// The session required to enter the guarded region at `location`.
    pub fn require_session(&self, location: &str) -> Result<Session, CoreError> {
        match self.inner.guard.view(location) {
            GuardView::Render(session) => Ok(session),
            GuardView::Placeholder | GuardView::RedirectToLogin { .. } => {
                Err(CoreError::NotAuthenticated)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, CoreError> {
        let resp = self.inner.api.login(email, password).await?;
        debug!(message = %resp.message, "login accepted");
        self.inner.guard.accept_credential(&resp.token)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, CoreError> {
        let resp = self.inner.api.register(name, email, password).await?;
        debug!(message = %resp.message, "registration accepted");
        self.inner.guard.accept_credential(&resp.token)
    }

    /// Clear the credential, stop supervision and drop cached entities.
    pub fn logout(&self) -> Result<(), CoreError> {
        let cleared = self.inner.guard.logout();
        self.inner.store.reset();
        cleared.map_err(CoreError::from)
    }

    // ── Resource handles ─────────────────────────────────────────────

    pub fn students(&self) -> Resources<'_, Student> {
        Resources::new(&self.inner.store.students, self.inner.api.students())
    }

    pub fn teachers(&self) -> Resources<'_, Teacher> {
        Resources::new(&self.inner.store.teachers, self.inner.api.teachers())
    }

    pub fn subjects(&self) -> Resources<'_, Subject> {
        Resources::new(&self.inner.store.subjects, self.inner.api.subjects())
    }

    pub fn sections(&self) -> Resources<'_, Section> {
        Resources::new(&self.inner.store.sections, self.inner.api.sections())
    }

    // ── Overview ─────────────────────────────────────────────────────

    /// Refresh all four slices at once and count what the server holds.
    ///
    /// Every fetch runs to completion; the first failure in kind order
    /// (students, teachers, subjects, sections) is returned.
    pub async fn overview(&self, query: &ListQuery) -> Result<Overview, CoreError> {
        let (st, te, su, se) = (
            self.students(),
            self.teachers(),
            self.subjects(),
            self.sections(),
        );
        let (students, teachers, subjects, sections) = tokio::join!(
            st.fetch_all(query),
            te.fetch_all(query),
            su.fetch_all(query),
            se.fetch_all(query),
        );
        let overview = Overview {
            students: total(&students?),
            teachers: total(&teachers?),
            subjects: total(&subjects?),
            sections: total(&sections?),
        };
        debug!(?overview, "overview refreshed");
        Ok(overview)
    }
}

/// Per-kind totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub students: u64,
    pub teachers: u64,
    pub subjects: u64,
    pub sections: u64,
}

/// The server's total when it paginates, otherwise the listed count.
fn total<T>(listing: &Listing<T>) -> u64 {
    listing.pagination.map_or_else(
        || u64::try_from(listing.items.len()).unwrap_or(u64::MAX),
        |p| p.total,
    )
}

// ── Resources ────────────────────────────────────────────────────────

/// One resource kind: its slice plus its API client.
pub struct Resources<'a, R: Resource> {
    slice: &'a Slice<R>,
    client: ResourceClient<'a, R>,
}

impl<'a, R: Resource> Resources<'a, R> {
    fn new(slice: &'a Slice<R>, client: ResourceClient<'a, R>) -> Self {
        Self { slice, client }
    }

    pub fn snapshot(&self) -> Arc<ResourceState<R>> {
        self.slice.snapshot()
    }

    pub fn subscribe(&self) -> SliceStream<R> {
        self.slice.subscribe()
    }

    pub fn clear_error(&self) {
        self.slice.clear_error();
    }

    /// Select a cached item by id (or clear the selection).
    /// Returns `false` if `id` is not in the slice.
    pub fn select(&self, id: Option<&EntityId>) -> bool {
        let Some(id) = id else {
            self.slice.select(None);
            return true;
        };
        match self.slice.snapshot().find(id) {
            Some(item) => {
                self.slice.select(Some(item.clone()));
                true
            }
            None => false,
        }
    }

    // ── Asynchronous operations ──────────────────────────────────────

    pub async fn fetch_all(&self, query: &ListQuery) -> Result<Listing<R>, CoreError> {
        self.settle(self.client.list(query), |listing| Mutation::ReplaceAll {
            items: listing.items.clone(),
            pagination: listing.pagination,
        })
        .await
    }

    /// Fetch one entity and make it the selection.
    pub async fn fetch_one(&self, id: &EntityId) -> Result<R, CoreError> {
        self.settle(self.client.get(id), |item| Mutation::Select(item.clone()))
            .await
    }

    pub async fn create(&self, input: &R::Create) -> Result<R, CoreError> {
        self.settle(self.client.create(input), |item| Mutation::Append(item.clone()))
            .await
    }

    pub async fn update(&self, id: &EntityId, patch: &R::Update) -> Result<R, CoreError> {
        self.settle(self.client.update(id, patch), |item| {
            Mutation::Replace(item.clone())
        })
        .await
    }

    pub async fn delete(&self, id: &EntityId) -> Result<(), CoreError> {
        self.settle(self.client.delete(id), |_| Mutation::Remove(id.clone()))
            .await
    }

    /// Drive one request through pending -> fulfilled | rejected.
    ///
    /// A rejected credential is not recorded on the slice; the auth stage
    /// has already handed it to the guard.
    async fn settle<T, F>(
        &self,
        request: F,
        mutation: impl FnOnce(&T) -> Mutation<R>,
    ) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, campus_api::Error>>,
    {
        let ticket = self.slice.pending();
        match request.await {
            Ok(value) => {
                self.slice.fulfill(ticket, mutation(&value));
                Ok(value)
            }
            Err(e) => {
                let err = CoreError::from(e);
                if err.is_auth_failure() {
                    self.slice.abandon(ticket);
                } else {
                    debug!(kind = %R::KIND, error = %err, "request rejected");
                    self.slice.reject(ticket, SliceError::from(&err));
                }
                Err(err)
            }
        }
    }
}

// ── Relationship operations ──────────────────────────────────────────

impl Resources<'_, Section> {
    /// Replace the section's subject assignments with `assignments`.
    pub async fn assign_subjects(
        &self,
        section_id: &EntityId,
        assignments: &[AssignmentInput],
    ) -> Result<Section, CoreError> {
        self.settle(
            self.client.assign_subjects(section_id, assignments),
            |section| Mutation::Replace(section.clone()),
        )
        .await
    }

    /// Replace the section's enrollments with `student_ids`.
    pub async fn enroll_students(
        &self,
        section_id: &EntityId,
        student_ids: &[EntityId],
    ) -> Result<Section, CoreError> {
        self.settle(
            self.client.enroll_students(section_id, student_ids),
            |section| Mutation::Replace(section.clone()),
        )
        .await
    }
}

impl Resources<'_, Teacher> {
    pub async fn assign_subjects(
        &self,
        teacher_id: &EntityId,
        subject_ids: &[EntityId],
        school_year: &str,
    ) -> Result<Teacher, CoreError> {
        self.settle(
            self.client
                .assign_subjects(teacher_id, subject_ids, school_year),
            |teacher| Mutation::Replace(teacher.clone()),
        )
        .await
    }

    /// Subjects a teacher holds; read-only, the slice is not touched.
    pub async fn subjects(
        &self,
        teacher_id: &EntityId,
        school_year: Option<&str>,
    ) -> Result<Vec<Subject>, CoreError> {
        Ok(self.client.subjects(teacher_id, school_year).await?)
    }
}
