//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod dashboard;
pub mod sections;
pub mod students;
pub mod subjects;
pub mod teachers;
pub mod util;

use campus_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(controller, args, global).await,
        Command::Register(args) => auth::register(controller, args, global).await,
        Command::Logout => auth::logout(controller, global),
        Command::Whoami => auth::whoami(controller, global),
        Command::Session(args) => auth::session(controller, args, global).await,
        Command::Dashboard(args) => dashboard::handle(controller, args, global).await,
        Command::Students(args) => students::handle(controller, args, global).await,
        Command::Teachers(args) => teachers::handle(controller, args, global).await,
        Command::Subjects(args) => subjects::handle(controller, args, global).await,
        Command::Sections(args) => sections::handle(controller, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are handled before dispatch".into(),
        )),
    }
}
