//! Teacher command handlers.

use tabled::Tabled;

use campus_core::{Controller, EntityId, NewTeacher, Teacher, TeacherPatch};

use crate::cli::{GlobalOpts, TeacherFields, TeachersArgs, TeachersCommand};
use crate::error::CliError;
use crate::output;

use super::subjects::SubjectRow;
use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TeacherRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Subjects")]
    subjects: String,
}

fn subject_codes(t: &Teacher) -> String {
    t.subjects
        .iter()
        .map(|s| s.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<&Teacher> for TeacherRow {
    fn from(t: &Teacher) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.full_name(),
            email: t.email.clone(),
            department: util::cell(t.department.as_ref()),
            subjects: subject_codes(t),
        }
    }
}

fn detail(t: &Teacher) -> String {
    output::detail_block(&[
        ("ID", t.id.to_string()),
        ("Name", t.full_name()),
        ("Email", t.email.clone()),
        ("Phone", util::cell(t.phone_number.as_ref())),
        ("Department", util::cell(t.department.as_ref())),
        ("Qualification", util::cell(t.qualification.as_ref())),
        ("Experience", util::cell(t.years_of_experience.as_ref())),
        ("School year", util::cell(t.school_year.as_ref())),
        ("Subjects", subject_codes(t)),
    ])
}

// ── Payloads ────────────────────────────────────────────────────────

fn new_teacher(fields: TeacherFields) -> Result<NewTeacher, CliError> {
    Ok(NewTeacher {
        first_name: util::required("first-name", fields.first_name)?,
        last_name: util::required("last-name", fields.last_name)?,
        email: util::required("email", fields.email)?,
        phone_number: fields.phone_number,
        department: fields.department,
        qualification: fields.qualification,
        years_of_experience: fields.years_of_experience,
        school_year: fields.school_year,
        ..NewTeacher::default()
    })
}

fn teacher_patch(fields: TeacherFields) -> TeacherPatch {
    TeacherPatch {
        first_name: fields.first_name,
        last_name: fields.last_name,
        email: fields.email,
        phone_number: fields.phone_number,
        department: fields.department,
        qualification: fields.qualification,
        years_of_experience: fields.years_of_experience,
        school_year: fields.school_year,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: TeachersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (_mount, _session) = util::authenticated(controller, "/teachers")?;
    let teachers = controller.teachers();

    match args.command {
        TeachersCommand::List { list, department } => {
            let mut query = util::list_query(list);
            query.department = department;

            let listing =
                util::with_spinner(global, "Loading teachers...", teachers.fetch_all(&query))
                    .await?;
            let out = output::render_list(
                &global.output,
                &listing.items,
                |x| TeacherRow::from(x),
                |t| t.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            util::print_pagination(global, listing.pagination.as_ref());
            Ok(())
        }

        TeachersCommand::Get { id } => {
            let teacher = teachers.fetch_one(&EntityId::from(id)).await?;
            let out = output::render_single(&global.output, &teacher, detail, |t| {
                t.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TeachersCommand::Create { fields, from_file } => {
            let input = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                new_teacher(fields)?
            };
            let created = teachers.create(&input).await?;
            output::status(
                global,
                &format!("Teacher {} created ({})", created.full_name(), created.id),
            );
            Ok(())
        }

        TeachersCommand::Update {
            id,
            fields,
            from_file,
        } => {
            let patch: TeacherPatch = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                teacher_patch(fields)
            };
            util::ensure_changes(&patch)?;
            let updated = teachers.update(&EntityId::from(id), &patch).await?;
            output::status(global, &format!("Teacher {} updated", updated.id));
            Ok(())
        }

        TeachersCommand::Delete { id } => {
            if !util::confirm(&format!("Delete teacher '{id}'?"), global.yes)? {
                return Ok(());
            }
            teachers.delete(&EntityId::from(id.as_str())).await?;
            output::status(global, &format!("Teacher {id} deleted"));
            Ok(())
        }

        TeachersCommand::AssignSubjects {
            id,
            subjects,
            school_year,
        } => {
            let subject_ids: Vec<EntityId> = subjects.into_iter().map(EntityId::from).collect();
            let updated = teachers
                .assign_subjects(&EntityId::from(id), &subject_ids, &school_year)
                .await?;
            output::status(
                global,
                &format!(
                    "{} now teaches {} subject(s) in {school_year}",
                    updated.full_name(),
                    updated.subjects.len()
                ),
            );
            Ok(())
        }

        TeachersCommand::Subjects { id, school_year } => {
            let held = teachers
                .subjects(&EntityId::from(id), school_year.as_deref())
                .await?;
            if held.is_empty() {
                output::hint(global, "No subjects assigned.");
                return Ok(());
            }
            let out = output::render_list(&global.output, &held, |x| SubjectRow::from(x), |s| {
                s.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
