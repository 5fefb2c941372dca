//! Session and state layer between `campus-api` and UI consumers (the CLI).
//!
//! - **[`TokenStore`]**: durable slot for the bearer credential, with
//!   in-memory, file and system-keyring backends.
//!
//! - **[`session`]**: decodes a credential into a [`Session`] (identity and
//!   expiry) without verifying its signature; pure given a [`Clock`].
//!
//! - **[`AuthGuard`]**: the `Loading` / `Authenticated` / `Unauthenticated`
//!   state machine. Checks once on mount, then every 60 seconds until
//!   unmounted; forced to log out whenever the server answers 401.
//!
//! - **[`AppStore`]**: one [`Slice`] per resource kind (`items`, `selected`,
//!   `loading`, `error`, `pagination`) plus the published [`AuthState`].
//!   Subscribe with [`SliceStream`].
//!
//! - **[`Controller`]**: facade wiring all of the above to the API client;
//!   its [`Resources`] handles run requests through slice transitions.

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod guard;
pub mod session;
pub mod store;
pub mod stream;
pub mod token;

// ── Primary re-exports ──────────────────────────────────────────────
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use controller::{Controller, Overview, Resources};
pub use error::{CoreError, ErrorKind, SliceError};
pub use guard::{AuthGuard, AuthState, GuardMount, GuardView};
pub use session::{DecodeError, Session};
pub use store::{AppStore, Mutation, RequestTicket, ResourceState, Slice};
pub use stream::{SliceStream, SliceWatchStream};
pub use token::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, StoredCredential, TokenStore,
    TokenStoreError,
};

// Wire types consumers need alongside the controller.
pub use campus_api::{
    AdviserRef, AssignmentInput, EntityId, FieldError, ListQuery, Listing, NewSection,
    NewStudent, NewSubject, NewTeacher, Pagination, ResourceKind, Section, SectionPatch,
    Student, StudentEnrollment, StudentPatch, StudentRef, Subject, SubjectAssignment,
    SubjectPatch, SubjectRef, Teacher, TeacherPatch, TeacherRef, TlsMode,
};
