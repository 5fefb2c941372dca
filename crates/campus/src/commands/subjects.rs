//! Subject command handlers.

use tabled::Tabled;

use campus_core::{Controller, EntityId, NewSubject, Subject, SubjectPatch};

use crate::cli::{GlobalOpts, SubjectFields, SubjectsArgs, SubjectsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct SubjectRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Teacher")]
    teacher: String,
}

impl From<&Subject> for SubjectRow {
    fn from(s: &Subject) -> Self {
        Self {
            id: s.id.to_string(),
            code: s.code.clone(),
            name: s.name.clone(),
            department: util::cell(s.department.as_ref()),
            teacher: s
                .teacher
                .as_ref()
                .map(campus_core::TeacherRef::full_name)
                .unwrap_or_default(),
        }
    }
}

fn detail(s: &Subject) -> String {
    output::detail_block(&[
        ("ID", s.id.to_string()),
        ("Code", s.code.clone()),
        ("Name", s.name.clone()),
        ("Department", util::cell(s.department.as_ref())),
        ("Description", util::cell(s.description.as_ref())),
        (
            "Teacher",
            s.teacher
                .as_ref()
                .map(campus_core::TeacherRef::full_name)
                .unwrap_or_default(),
        ),
    ])
}

fn new_subject(fields: SubjectFields) -> Result<NewSubject, CliError> {
    Ok(NewSubject {
        name: util::required("name", fields.name)?,
        code: util::required("code", fields.code)?,
        description: fields.description,
        department: fields.department,
    })
}

fn subject_patch(fields: SubjectFields) -> SubjectPatch {
    SubjectPatch {
        name: fields.name,
        code: fields.code,
        description: fields.description,
        department: fields.department,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: SubjectsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (_mount, _session) = util::authenticated(controller, "/subjects")?;
    let subjects = controller.subjects();

    match args.command {
        SubjectsCommand::List { list, department } => {
            let mut query = util::list_query(list);
            query.department = department;

            let listing =
                util::with_spinner(global, "Loading subjects...", subjects.fetch_all(&query))
                    .await?;
            let out = output::render_list(
                &global.output,
                &listing.items,
                |x| SubjectRow::from(x),
                |s| s.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            util::print_pagination(global, listing.pagination.as_ref());
            Ok(())
        }

        SubjectsCommand::Get { id } => {
            let subject = subjects.fetch_one(&EntityId::from(id)).await?;
            let out = output::render_single(&global.output, &subject, detail, |s| {
                s.id.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SubjectsCommand::Create { fields, from_file } => {
            let input = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                new_subject(fields)?
            };
            let created = subjects.create(&input).await?;
            output::status(
                global,
                &format!("Subject {} created ({})", created.code, created.id),
            );
            Ok(())
        }

        SubjectsCommand::Update {
            id,
            fields,
            from_file,
        } => {
            let patch: SubjectPatch = if let Some(ref path) = from_file {
                serde_json::from_value(util::read_json_file(path)?)?
            } else {
                subject_patch(fields)
            };
            util::ensure_changes(&patch)?;
            let updated = subjects.update(&EntityId::from(id), &patch).await?;
            output::status(global, &format!("Subject {} updated", updated.id));
            Ok(())
        }

        SubjectsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete subject '{id}'?"), global.yes)? {
                return Ok(());
            }
            subjects.delete(&EntityId::from(id.as_str())).await?;
            output::status(global, &format!("Subject {id} deleted"));
            Ok(())
        }
    }
}
