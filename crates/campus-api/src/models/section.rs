use serde::{Deserialize, Serialize};

use super::lenient;
use super::{EntityId, SubjectRef, TeacherRef};
use crate::resources::{Resource, ResourceKind};

// ── Embedded snapshots ──────────────────────────────────────────────

/// The section adviser as embedded by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviserRef {
    pub id: EntityId,
    #[serde(default, alias = "firstname")]
    pub first_name: String,
    #[serde(default, alias = "lastname")]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRef {
    pub id: EntityId,
    #[serde(default, alias = "firstname")]
    pub first_name: String,
    #[serde(default, alias = "lastname")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// One subject taught in a section: subject x teacher x schedule x room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAssignment {
    pub id: EntityId,
    pub subject: SubjectRef,
    pub teacher: TeacherRef,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub room: String,
}

/// One student's membership in a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEnrollment {
    pub id: EntityId,
    pub student: StudentRef,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "enrollmentdate")]
    pub enrollment_date: String,
}

// ── Section ─────────────────────────────────────────────────────────

/// A class section with its subject assignments and enrollments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: EntityId,
    pub name: String,
    #[serde(default, alias = "gradelevel", deserialize_with = "lenient::text_or_number")]
    pub grade_level: Option<String>,
    #[serde(default, alias = "schoolyear")]
    pub school_year: Option<String>,
    #[serde(default, alias = "academicyear")]
    pub academic_year: Option<String>,
    #[serde(default, alias = "adviserid")]
    pub adviser_id: Option<EntityId>,
    #[serde(default)]
    pub adviser: Option<AdviserRef>,
    #[serde(default)]
    pub subjects: Vec<SubjectAssignment>,
    #[serde(default)]
    pub students: Vec<StudentEnrollment>,
    #[serde(default, alias = "studentcount", deserialize_with = "lenient::count")]
    pub student_count: Option<u32>,
}

impl Section {
    /// Enrolled student count, preferring the server's figure.
    pub fn enrolled(&self) -> usize {
        self.student_count
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(self.students.len())
    }
}

// ── Inputs ──────────────────────────────────────────────────────────

/// One entry of an assignment-set replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    pub subject_id: EntityId,
    pub teacher_id: EntityId,
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub room: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSection {
    pub name: String,
    pub grade_level: String,
    pub school_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adviser_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<AssignmentInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adviser_id: Option<EntityId>,
    /// When present, replaces the whole assignment set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<AssignmentInput>>,
}

impl Resource for Section {
    type Create = NewSection;
    type Update = SectionPatch;

    const KIND: ResourceKind = ResourceKind::Section;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
