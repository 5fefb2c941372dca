// Typed CRUD wrappers per resource kind.
//
// All four kinds share one shape (list / get / create / update / delete
// under `/<kind>/<kinds>`); the `Resource` trait carries the per-kind
// constants so a single generic client serves them all. Relationship
// endpoints (section assignments and enrollments, teacher subjects) are
// inherent methods on the concrete client types.

use std::marker::PhantomData;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{AssignmentInput, EntityId, Section, Subject, Teacher};

// ── ResourceKind ────────────────────────────────────────────────────

/// The four server-side collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Student,
    Teacher,
    Subject,
    Section,
}

impl ResourceKind {
    /// JSON key holding a single entity in response envelopes.
    pub fn singular_key(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Subject => "subject",
            Self::Section => "section",
        }
    }

    /// JSON key holding a list of entities in response envelopes.
    pub fn plural_key(self) -> &'static str {
        match self {
            Self::Student => "students",
            Self::Teacher => "teachers",
            Self::Subject => "subjects",
            Self::Section => "sections",
        }
    }

    /// Path segments of the collection endpoint, e.g. `student/students`.
    pub fn collection_segments(self) -> [&'static str; 2] {
        [self.singular_key(), self.plural_key()]
    }
}

// ── Resource trait ──────────────────────────────────────────────────

/// An entity type the API can list, fetch, create, update and delete.
pub trait Resource: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Payload for `create`.
    type Create: Serialize + Sync;
    /// Partial payload for `update`.
    type Update: Serialize + Sync;

    const KIND: ResourceKind;

    fn id(&self) -> &EntityId;
}

// ── Query / listing types ───────────────────────────────────────────

/// Filters accepted by the list endpoints. Unset fields are not sent.
///
/// Each backend collection honours its own subset (`grade` and `section`
/// for students, `department` for teachers and subjects, `gradeLevel` for
/// sections); unknown filters are ignored server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
}

/// Server-side pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(alias = "totalpages")]
    pub total_pages: u32,
}

/// One page of a collection, in server order.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

// ── ResourceClient ──────────────────────────────────────────────────

/// CRUD operations for one resource kind.
pub struct ResourceClient<'a, R> {
    api: &'a ApiClient,
    _kind: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> ResourceClient<'a, R> {
    pub(crate) fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            _kind: PhantomData,
        }
    }

    fn collection(&self) -> [&'static str; 2] {
        R::KIND.collection_segments()
    }

    fn member<'s>(&self, id: &'s EntityId) -> [&'s str; 3] {
        let [group, plural] = self.collection();
        [group, plural, id.as_str()]
    }

    /// `GET /<kind>/<kinds>?<query>`
    pub async fn list(&self, query: &ListQuery) -> Result<Listing<R>, Error> {
        let builder = self.api.request(Method::GET, &self.collection())?.query(query);
        let mut envelope = self.api.execute(builder).await?;
        let items: Vec<R> = envelope.take_list(R::KIND.plural_key())?;
        let pagination = envelope.take_optional("pagination")?;
        debug!(kind = %R::KIND, count = items.len(), "listed");
        Ok(Listing { items, pagination })
    }

    /// `GET /<kind>/<kinds>/{id}`
    pub async fn get(&self, id: &EntityId) -> Result<R, Error> {
        let builder = self.api.request(Method::GET, &self.member(id))?;
        self.api.execute(builder).await?.take(R::KIND.singular_key())
    }

    /// `POST /<kind>/<kinds>`
    pub async fn create(&self, input: &R::Create) -> Result<R, Error> {
        let builder = self
            .api
            .request(Method::POST, &self.collection())?
            .json(input);
        self.api.execute(builder).await?.take(R::KIND.singular_key())
    }

    /// `PUT /<kind>/<kinds>/{id}`
    pub async fn update(&self, id: &EntityId, patch: &R::Update) -> Result<R, Error> {
        let builder = self.api.request(Method::PUT, &self.member(id))?.json(patch);
        self.api.execute(builder).await?.take(R::KIND.singular_key())
    }

    /// `DELETE /<kind>/<kinds>/{id}`
    pub async fn delete(&self, id: &EntityId) -> Result<(), Error> {
        let builder = self.api.request(Method::DELETE, &self.member(id))?;
        self.api.execute(builder).await?;
        Ok(())
    }
}

// ── Section relationships ───────────────────────────────────────────

impl ResourceClient<'_, Section> {
    /// Replace the section's whole subject-assignment set.
    ///
    /// `POST /section/sections/{id}/subjects`
    pub async fn assign_subjects(
        &self,
        section_id: &EntityId,
        assignments: &[AssignmentInput],
    ) -> Result<Section, Error> {
        let [group, plural, id] = self.member(section_id);
        let builder = self
            .api
            .request(Method::POST, &[group, plural, id, "subjects"])?
            .json(&json!({ "subjects": assignments }));
        self.api.execute(builder).await?.take("section")
    }

    /// Replace the section's whole enrollment set.
    ///
    /// `POST /section/sections/{id}/students`
    pub async fn enroll_students(
        &self,
        section_id: &EntityId,
        student_ids: &[EntityId],
    ) -> Result<Section, Error> {
        let [group, plural, id] = self.member(section_id);
        let builder = self
            .api
            .request(Method::POST, &[group, plural, id, "students"])?
            .json(&json!({ "studentIds": student_ids }));
        self.api.execute(builder).await?.take("section")
    }
}

// ── Teacher subjects ────────────────────────────────────────────────

impl ResourceClient<'_, Teacher> {
    /// Assign subjects to a teacher for one school year.
    ///
    /// `POST /teacher/teachers/{id}/subjects`
    pub async fn assign_subjects(
        &self,
        teacher_id: &EntityId,
        subject_ids: &[EntityId],
        school_year: &str,
    ) -> Result<Teacher, Error> {
        let [group, plural, id] = self.member(teacher_id);
        let builder = self
            .api
            .request(Method::POST, &[group, plural, id, "subjects"])?
            .json(&json!({ "subjectIds": subject_ids, "schoolYear": school_year }));
        self.api.execute(builder).await?.take("teacher")
    }

    /// Subjects taught by a teacher, optionally restricted to one school year.
    ///
    /// `GET /teacher/teachers/{id}/subjects`
    pub async fn subjects(
        &self,
        teacher_id: &EntityId,
        school_year: Option<&str>,
    ) -> Result<Vec<Subject>, Error> {
        let [group, plural, id] = self.member(teacher_id);
        let mut builder = self
            .api
            .request(Method::GET, &[group, plural, id, "subjects"])?;
        if let Some(year) = school_year {
            builder = builder.query(&[("schoolYear", year)]);
        }
        self.api.execute(builder).await?.take_list("subjects")
    }
}
