//! Dashboard: one row per resource kind with its total.

use tabled::Tabled;

use campus_core::{Controller, ListQuery, Overview};

use crate::cli::{DashboardArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Total")]
    total: u64,
}

fn rows(overview: &Overview) -> Vec<CountRow> {
    vec![
        CountRow {
            kind: "Students",
            total: overview.students,
        },
        CountRow {
            kind: "Teachers",
            total: overview.teachers,
        },
        CountRow {
            kind: "Subjects",
            total: overview.subjects,
        },
        CountRow {
            kind: "Sections",
            total: overview.sections,
        },
    ]
}

pub async fn handle(
    controller: &Controller,
    args: DashboardArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (_mount, _session) = util::authenticated(controller, "/")?;

    let query = ListQuery {
        school_year: args.school_year,
        ..ListQuery::default()
    };
    let overview =
        util::with_spinner(global, "Loading dashboard...", controller.overview(&query)).await?;

    let out = output::render_single(
        &global.output,
        &overview,
        |o| output::render_table(&rows(o)),
        |o| {
            format!(
                "students {}\nteachers {}\nsubjects {}\nsections {}",
                o.students, o.teachers, o.subjects, o.sections
            )
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_kind_order() {
        let overview = Overview {
            students: 120,
            teachers: 9,
            subjects: 14,
            sections: 4,
        };
        let table = output::render_table(&rows(&overview));
        let students = table.find("Students").unwrap_or(usize::MAX);
        let sections = table.find("Sections").unwrap_or(0);
        assert!(students < sections);
        assert!(table.contains("120"));
    }
}
