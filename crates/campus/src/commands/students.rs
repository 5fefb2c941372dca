//! Student command handlers.

use tabled::Tabled;

use campus_core::{Controller, EntityId, NewStudent, Student, StudentPatch};

use crate::cli::{GlobalOpts, StudentFields, StudentsArgs, StudentsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StudentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Grade")]
    grade: String,
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Email")]
    email: String,
}

impl From<&Student> for StudentRow {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.full_name(),
            grade: util::cell(s.grade.as_ref()),
            section: util::cell(s.section.as_ref()),
            email: util::cell(s.email.as_ref()),
        }
    }
}

fn detail(s: &Student) -> String {
    output::detail_block(&[
        ("ID", s.id.to_string()),
        ("Name", s.full_name()),
        ("Email", util::cell(s.email.as_ref())),
        ("Gender", util::cell(s.gender.as_ref())),
        ("Age", util::cell(s.age.as_ref())),
        ("Grade", util::cell(s.grade.as_ref())),
        ("Section", util::cell(s.section.as_ref())),
        ("Class section", util::cell(s.class_section.as_ref())),
        ("School year", util::cell(s.school_year.as_ref())),
        ("School", util::cell(s.school_name.as_ref())),
        ("Division", util::cell(s.division.as_ref())),
    ])
}

// ── Payloads ────────────────────────────────────────────────────────

fn new_student(fields: StudentFields) -> Result<NewStudent, CliError> {
    Ok(NewStudent {
        first_name: util::required("first-name", fields.first_name)?,
        last_name: util::required("last-name", fields.last_name)?,
        middle_name: fields.middle_name,
        email: fields.email,
        gender: fields.gender,
        age: fields.age,
        grade: fields.grade,
        section: fields.section,
        school_year: fields.school_year,
        ..NewStudent::default()
    })
}

fn student_patch(fields: StudentFields) -> StudentPatch {
    StudentPatch {
        first_name: fields.first_name,
        middle_name: fields.middle_name,
        last_name: fields.last_name,
        email: fields.email,
        gender: fields.gender,
        age: fields.age,
        grade: fields.grade,
        section: fields.section,
        school_year: fields.school_year,
        ..StudentPatch::default()
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: StudentsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (_mount, _session) = util::authenticated(controller, "/students")?;
    let students = controller.students();

    match args.command {
        StudentsCommand::List {
            list,
            grade,
            section,
        } => {
            let mut query = util::list_query(list);
            query.grade = grade;
            query.section = section;

            let listing =
                util::with_spinner(global, "Loading students...", students.fetch_all(&query))
                    .await?;
            let out = output::render_list(
                &global.output,
                &listing.items,
                |x| StudentRow::from(x),
                |s| s.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            util::print_pagination(global, listing.pagination.as_ref());
            Ok(())
        }

        StudentsCommand::Get { id } => {
            let student = students.fetch_one(&EntityId::from(id)).await?;
            let out = output::render_single(&global.output, &student, detail, |s| {
                s.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StudentsCommand::Create { fields, from_file } => {
            let input = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                new_student(fields)?
            };
            let created = students.create(&input).await?;
            output::status(
                global,
                &format!("Student {} created ({})", created.full_name(), created.id),
            );
            Ok(())
        }

        StudentsCommand::Update {
            id,
            fields,
            from_file,
        } => {
            let patch: StudentPatch = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                student_patch(fields)
            };
            util::ensure_changes(&patch)?;
            let updated = students.update(&EntityId::from(id), &patch).await?;
            output::status(global, &format!("Student {} updated", updated.id));
            Ok(())
        }

        StudentsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete student '{id}'?"), global.yes)? {
                return Ok(());
            }
            students.delete(&EntityId::from(id.as_str())).await?;
            output::status(global, &format!("Student {id} deleted"));
            Ok(())
        }
    }
}
