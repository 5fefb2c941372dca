//! Shared helpers for command handlers.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use campus_core::{Controller, GuardMount, ListQuery, Pagination, Session};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{GlobalOpts, ListArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Check the stored credential and hold supervision for the command.
///
/// `location` is the guarded area being entered (e.g. `/students`); it
/// only shows up in logs.
pub fn authenticated(
    controller: &Controller,
    location: &str,
) -> Result<(GuardMount, Session), CliError> {
    let mount = controller.mount_guard();
    let session = controller.require_session(location).inspect_err(|_| {
        tracing::debug!(%location, "no live session, login required");
    })?;
    Ok((mount, session))
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !output::is_interactive() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<serde_json::Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON in {}: {e}", path.display()),
    })
}

/// Unwrap a flag that is mandatory when no `--from-file` is given.
pub fn required<T>(flag: &str, value: Option<T>) -> Result<T, CliError> {
    value.ok_or_else(|| CliError::Validation {
        field: flag.into(),
        reason: format!("--{flag} is required unless --from-file is given"),
    })
}

/// Reject an update that would send an empty payload.
pub fn ensure_changes<T: Default + PartialEq>(patch: &T) -> Result<(), CliError> {
    if *patch == T::default() {
        return Err(CliError::Validation {
            field: "update".into(),
            reason: "no fields to change; pass at least one flag or --from-file".into(),
        });
    }
    Ok(())
}

/// Shared list flags as a query; kind-specific filters are set by the caller.
pub fn list_query(args: ListArgs) -> ListQuery {
    ListQuery {
        page: args.page,
        limit: args.limit,
        search: args.search,
        school_year: args.school_year,
        ..ListQuery::default()
    }
}

/// Footer line under a table, e.g. `Page 2 of 5 (118 total)`.
pub fn print_pagination(global: &GlobalOpts, pagination: Option<&Pagination>) {
    if !matches!(global.output, OutputFormat::Table) {
        return;
    }
    if let Some(p) = pagination {
        output::hint(
            global,
            &format!("Page {} of {} ({} total)", p.page, p.total_pages.max(1), p.total),
        );
    }
}

/// Run `fut` behind a spinner on interactive table output.
pub async fn with_spinner<F: Future>(global: &GlobalOpts, message: &str, fut: F) -> F::Output {
    let show = !global.quiet
        && matches!(global.output, OutputFormat::Table)
        && output::is_interactive();
    if !show {
        return fut.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(80));
    let result = fut.await;
    spinner.finish_and_clear();
    result
}

/// Format an optional value for a table cell.
pub fn cell<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}
