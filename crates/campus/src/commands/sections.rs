//! Section command handlers, including subject assignments and enrollment.

use std::fmt::Write as _;

use serde_json::Value;
use tabled::Tabled;

use campus_core::{
    AssignmentInput, Controller, EntityId, NewSection, Section, SectionPatch, StudentEnrollment,
    SubjectAssignment,
};

use crate::cli::{GlobalOpts, SectionFields, SectionsArgs, SectionsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Grade")]
    grade_level: String,
    #[tabled(rename = "School Year")]
    school_year: String,
    #[tabled(rename = "Adviser")]
    adviser: String,
    #[tabled(rename = "Subjects")]
    subjects: usize,
    #[tabled(rename = "Students")]
    students: usize,
}

impl From<&Section> for SectionRow {
    fn from(s: &Section) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
            grade_level: util::cell(s.grade_level.as_ref()),
            school_year: util::cell(s.school_year.as_ref()),
            adviser: adviser_name(s),
            subjects: s.subjects.len(),
            students: s.enrolled(),
        }
    }
}

#[derive(Tabled)]
struct AssignmentRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Teacher")]
    teacher: String,
    #[tabled(rename = "Schedule")]
    schedule: String,
    #[tabled(rename = "Room")]
    room: String,
}

impl From<&SubjectAssignment> for AssignmentRow {
    fn from(a: &SubjectAssignment) -> Self {
        Self {
            code: a.subject.code.clone(),
            subject: a.subject.name.clone(),
            teacher: a.teacher.full_name(),
            schedule: a.schedule.clone(),
            room: a.room.clone(),
        }
    }
}

#[derive(Tabled)]
struct EnrollmentRow {
    #[tabled(rename = "Student ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Enrolled")]
    date: String,
}

impl From<&StudentEnrollment> for EnrollmentRow {
    fn from(e: &StudentEnrollment) -> Self {
        Self {
            id: e.student.id.to_string(),
            name: format!("{} {}", e.student.first_name, e.student.last_name),
            status: e.status.clone(),
            date: e.enrollment_date.clone(),
        }
    }
}

fn adviser_name(s: &Section) -> String {
    match (&s.adviser, &s.adviser_id) {
        (Some(a), _) => format!("{} {}", a.first_name, a.last_name),
        (None, Some(id)) => id.to_string(),
        (None, None) => String::new(),
    }
}

fn detail(s: &Section) -> String {
    let mut out = output::detail_block(&[
        ("ID", s.id.to_string()),
        ("Name", s.name.clone()),
        ("Grade level", util::cell(s.grade_level.as_ref())),
        ("School year", util::cell(s.school_year.as_ref())),
        ("Adviser", adviser_name(s)),
        ("Students", s.enrolled().to_string()),
    ]);

    if !s.subjects.is_empty() {
        let rows: Vec<AssignmentRow> = s.subjects.iter().map(AssignmentRow::from).collect();
        let _ = write!(out, "\n\nSubjects\n{}", output::render_table(&rows));
    }
    if !s.students.is_empty() {
        let rows: Vec<EnrollmentRow> = s.students.iter().map(EnrollmentRow::from).collect();
        let _ = write!(out, "\n\nEnrollment\n{}", output::render_table(&rows));
    }
    out
}

// ── Payloads ────────────────────────────────────────────────────────

fn new_section(fields: SectionFields) -> Result<NewSection, CliError> {
    Ok(NewSection {
        name: util::required("name", fields.name)?,
        grade_level: util::required("grade-level", fields.grade_level)?,
        school_year: util::required("school-year", fields.school_year)?,
        adviser_id: fields.adviser.map(EntityId::from),
        subjects: Vec::new(),
    })
}

fn section_patch(fields: SectionFields) -> SectionPatch {
    SectionPatch {
        name: fields.name,
        grade_level: fields.grade_level,
        school_year: fields.school_year,
        adviser_id: fields.adviser.map(EntityId::from),
        subjects: None,
    }
}

/// Parse `SUBJECT_ID:TEACHER_ID[:SCHEDULE[:ROOM]]`.
///
/// The room is everything after the third colon, so schedules must not
/// contain one (`MWF 0800-0900`, not `MWF 08:00`).
fn parse_assignment(raw: &str) -> Result<AssignmentInput, CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: "assign".into(),
        reason: format!("'{raw}': {reason}"),
    };

    let mut parts = raw.splitn(4, ':');
    let subject = parts.next().filter(|s| !s.is_empty());
    let teacher = parts.next().filter(|s| !s.is_empty());
    let (Some(subject), Some(teacher)) = (subject, teacher) else {
        return Err(invalid("expected SUBJECT_ID:TEACHER_ID[:SCHEDULE[:ROOM]]"));
    };

    Ok(AssignmentInput {
        subject_id: EntityId::from(subject),
        teacher_id: EntityId::from(teacher),
        schedule: parts.next().unwrap_or_default().to_owned(),
        room: parts.next().unwrap_or_default().to_owned(),
    })
}

/// Accept either a bare array or `{"subjects": [...]}`.
fn assignments_from_json(value: Value) -> Result<Vec<AssignmentInput>, CliError> {
    let list = match value {
        Value::Object(mut map) => map.remove("subjects").unwrap_or(Value::Null),
        other => other,
    };
    Ok(serde_json::from_value(list)?)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: SectionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (_mount, _session) = util::authenticated(controller, "/sections")?;
    let sections = controller.sections();

    match args.command {
        SectionsCommand::List { list, grade_level } => {
            let mut query = util::list_query(list);
            query.grade_level = grade_level;

            let listing =
                util::with_spinner(global, "Loading sections...", sections.fetch_all(&query))
                    .await?;
            let out = output::render_list(
                &global.output,
                &listing.items,
                |x| SectionRow::from(x),
                |s| s.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            util::print_pagination(global, listing.pagination.as_ref());
            Ok(())
        }

        SectionsCommand::Get { id } => {
            let section = sections.fetch_one(&EntityId::from(id)).await?;
            let out = output::render_single(&global.output, &section, detail, |s| {
                s.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SectionsCommand::Create { fields, from_file } => {
            let input = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                new_section(fields)?
            };
            let created = sections.create(&input).await?;
            output::status(
                global,
                &format!("Section {} created ({})", created.name, created.id),
            );
            Ok(())
        }

        SectionsCommand::Update {
            id,
            fields,
            from_file,
        } => {
            let patch: SectionPatch = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                section_patch(fields)
            };
            util::ensure_changes(&patch)?;
            let updated = sections.update(&EntityId::from(id), &patch).await?;
            output::status(global, &format!("Section {} updated", updated.id));
            Ok(())
        }

        SectionsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete section '{id}'?"), global.yes)? {
                return Ok(());
            }
            sections.delete(&EntityId::from(id.as_str())).await?;
            output::status(global, &format!("Section {id} deleted"));
            Ok(())
        }

        SectionsCommand::AssignSubjects {
            id,
            assignments,
            from_file,
        } => {
            let inputs = if let Some(ref path) = from_file {
                assignments_from_json(util::read_json_file(path)?)?
            } else {
                assignments
                    .iter()
                    .map(|raw| parse_assignment(raw))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let updated = sections
                .assign_subjects(&EntityId::from(id), &inputs)
                .await?;
            output::status(
                global,
                &format!(
                    "Section {} now has {} subject assignment(s)",
                    updated.name,
                    updated.subjects.len()
                ),
            );
            Ok(())
        }

        SectionsCommand::Enroll { id, students } => {
            if students.is_empty()
                && !util::confirm(
                    &format!("Remove every student from section '{id}'?"),
                    global.yes,
                )?
            {
                return Ok(());
            }
            let student_ids: Vec<EntityId> = students.into_iter().map(EntityId::from).collect();
            let updated = sections
                .enroll_students(&EntityId::from(id), &student_ids)
                .await?;
            output::status(
                global,
                &format!(
                    "Section {} now has {} student(s)",
                    updated.name,
                    updated.enrolled()
                ),
            );
            Ok(())
        }
    }
}
