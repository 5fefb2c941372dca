// Wire models for the four campus collections.
//
// The backend is not consistent about field casing (`firstName` vs
// `firstname`) or scalar types (`gradeLevel` as string or number), so
// every model accepts both spellings and normalizes on the way in.

mod entity_id;
mod section;
mod student;
mod subject;
mod teacher;

pub use entity_id::EntityId;
pub use section::{
    AdviserRef, AssignmentInput, NewSection, Section, SectionPatch, StudentEnrollment, StudentRef,
    SubjectAssignment,
};
pub use student::{NewStudent, Student, StudentPatch};
pub use subject::{NewSubject, Subject, SubjectPatch, TeacherRef};
pub use teacher::{NewTeacher, SubjectRef, Teacher, TeacherPatch};

// ── Lenient scalars ─────────────────────────────────────────────────

pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept a string, a number, or null; numbers are rendered in decimal.
    pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected string or number, got {other}"
            ))),
        }
    }

    /// Accept a non-negative integer given either as a number or a numeric string.
    pub(crate) fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("{n} is not a valid count"))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("{s:?} is not a valid count"))),
            Some(other) => Err(serde::de::Error::custom(format!(
                "expected a count, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::lenient::text_or_number")]
        grade: Option<String>,
        #[serde(default, deserialize_with = "super::lenient::count")]
        age: Option<u32>,
    }

    #[test]
    fn lenient_scalars_accept_both_shapes() {
        let a: Probe = serde_json::from_str(r#"{"grade": 7, "age": "12"}"#).unwrap();
        assert_eq!(a.grade.as_deref(), Some("7"));
        assert_eq!(a.age, Some(12));

        let b: Probe = serde_json::from_str(r#"{"grade": "Grade 7", "age": 13}"#).unwrap();
        assert_eq!(b.grade.as_deref(), Some("Grade 7"));
        assert_eq!(b.age, Some(13));

        let c: Probe = serde_json::from_str("{}").unwrap();
        assert!(c.grade.is_none() && c.age.is_none());
    }

    #[test]
    fn lenient_count_rejects_negative() {
        assert!(serde_json::from_str::<Probe>(r#"{"age": -1}"#).is_err());
    }
}
