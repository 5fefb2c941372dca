// campus-api: Async Rust client for the campus school-administration API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod resources;
pub mod transport;

pub use auth::{
    AuthLayer, AuthResponse, AuthUser, CredentialSource, NoCredentials, StaticCredential,
    UnauthorizedHandler,
};
pub use client::ApiClient;
pub use error::{Error, FieldError};
pub use models::{
    AdviserRef, AssignmentInput, EntityId, NewSection, NewStudent, NewSubject, NewTeacher,
    Section, SectionPatch, Student, StudentEnrollment, StudentPatch, StudentRef, Subject,
    SubjectAssignment, SubjectPatch, SubjectRef, Teacher, TeacherPatch, TeacherRef,
};
pub use resources::{ListQuery, Listing, Pagination, Resource, ResourceClient, ResourceKind};
pub use transport::{TlsMode, TransportConfig};
