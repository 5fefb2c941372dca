// ── Application store ──
//
// The single state container shared by the guard, the controller and any
// UI layer. Constructed once and passed around as `Arc<AppStore>`.

mod slice;

pub use slice::{Mutation, RequestTicket, ResourceState, Slice};

use campus_api::{Section, Student, Subject, Teacher};
use tokio::sync::watch;

use crate::guard::AuthState;

/// Resource slices plus the published authentication state.
pub struct AppStore {
    pub(crate) students: Slice<Student>,
    pub(crate) teachers: Slice<Teacher>,
    pub(crate) subjects: Slice<Subject>,
    pub(crate) sections: Slice<Section>,
    auth: watch::Sender<AuthState>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        let (auth, _) = watch::channel(AuthState::Loading);
        Self {
            students: Slice::new(),
            teachers: Slice::new(),
            subjects: Slice::new(),
            sections: Slice::new(),
            auth,
        }
    }

    pub fn students(&self) -> &Slice<Student> {
        &self.students
    }

    pub fn teachers(&self) -> &Slice<Teacher> {
        &self.teachers
    }

    pub fn subjects(&self) -> &Slice<Subject> {
        &self.subjects
    }

    pub fn sections(&self) -> &Slice<Section> {
        &self.sections
    }

    // ── Authentication state ─────────────────────────────────────────

    pub fn auth_state(&self) -> AuthState {
        self.auth.borrow().clone()
    }

    pub fn subscribe_auth(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }

    /// Publish `next`, notifying subscribers only on an actual change.
    pub(crate) fn set_auth(&self, next: AuthState) -> bool {
        self.auth.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        })
    }

    /// Drop every cached entity from all four slices.
    pub fn reset(&self) {
        self.students.reset();
        self.teachers.reset();
        self.subjects.reset();
        self.sections.reset();
    }
}
