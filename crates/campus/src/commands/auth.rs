//! Login, registration, logout and session inspection.

use chrono::{DateTime, Utc};
use dialoguer::Input;
use secrecy::SecretString;
use serde::Serialize;

use campus_core::{AuthState, Controller, Session};

use crate::cli::{GlobalOpts, LoginArgs, RegisterArgs, SessionArgs, SessionCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Session view ────────────────────────────────────────────────────

#[derive(Serialize)]
struct SessionView<'a> {
    #[serde(flatten)]
    session: &'a Session,
    remaining_secs: i64,
}

impl<'a> SessionView<'a> {
    fn new(session: &'a Session, now: DateTime<Utc>) -> Self {
        Self {
            session,
            remaining_secs: session.remaining(now).num_seconds(),
        }
    }
}

fn humanize(secs: i64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m"),
    }
}

fn session_detail(view: &SessionView<'_>) -> String {
    let s = view.session;
    output::detail_block(&[
        ("User ID", s.subject_id.to_string()),
        ("Name", s.display_name.clone().unwrap_or_default()),
        ("Email", s.email.clone().unwrap_or_default()),
        ("Expires", s.expires_at.to_rfc3339()),
        ("Remaining", humanize(view.remaining_secs)),
    ])
}

fn print_session(global: &GlobalOpts, session: &Session) {
    let view = SessionView::new(session, Utc::now());
    let out = output::render_single(&global.output, &view, session_detail, |v| {
        v.session.subject_id.to_string()
    });
    output::print_output(&out, global.quiet);
}

// ── Prompts ─────────────────────────────────────────────────────────

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn text_or_prompt(value: Option<String>, flag: &str, label: &str) -> Result<String, CliError> {
    if let Some(v) = value {
        return Ok(v);
    }
    if !output::is_interactive() {
        return Err(CliError::Validation {
            field: flag.into(),
            reason: format!("--{flag} is required in non-interactive mode"),
        });
    }
    Input::<String>::new()
        .with_prompt(label)
        .interact_text()
        .map_err(prompt_err)
}

fn password_or_prompt(value: Option<String>) -> Result<SecretString, CliError> {
    if let Some(v) = value {
        return Ok(SecretString::from(v));
    }
    if !output::is_interactive() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "--password (or CAMPUS_PASSWORD) is required in non-interactive mode".into(),
        });
    }
    let pass = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    Ok(SecretString::from(pass))
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn login(
    controller: &Controller,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let email = text_or_prompt(args.email, "email", "Email")?;
    let password = password_or_prompt(args.password)?;

    let session =
        util::with_spinner(global, "Logging in...", controller.login(&email, &password)).await?;
    let who = session.display_name.as_deref().unwrap_or(email.as_str());
    output::status(global, &format!("Logged in as {who}"));
    Ok(())
}

pub async fn register(
    controller: &Controller,
    args: RegisterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let name = text_or_prompt(args.name, "name", "Name")?;
    let email = text_or_prompt(args.email, "email", "Email")?;
    let password = password_or_prompt(args.password)?;

    util::with_spinner(
        global,
        "Creating account...",
        controller.register(&name, &email, &password),
    )
    .await?;
    output::status(global, &format!("Registered and logged in as {name}"));
    Ok(())
}

pub fn logout(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    controller.logout()?;
    output::status(global, "Logged out");
    Ok(())
}

pub fn whoami(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let (_mount, session) = util::authenticated(controller, "/whoami")?;
    print_session(global, &session);
    Ok(())
}

pub async fn session(
    controller: &Controller,
    args: SessionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SessionCommand::Show => whoami(controller, global),
        SessionCommand::Watch => watch(controller, global).await,
    }
}

/// Stay mounted, reporting every auth transition, until the session ends
/// or the user interrupts.
async fn watch(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let (_mount, session) = util::authenticated(controller, "/session")?;
    print_session(global, &session);
    output::hint(
        global,
        &format!(
            "Checking every {}s; press Ctrl-C to stop.",
            controller.guard().period().as_secs()
        ),
    );

    let mut rx = controller.store().subscribe_auth();
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = rx.borrow_and_update().clone();
                match state {
                    AuthState::Authenticated(ref s) => print_session(global, s),
                    AuthState::Loading => {}
                    AuthState::Unauthenticated => {
                        output::hint(global, "Session ended; stored credential cleared.");
                        return Err(campus_core::CoreError::NotAuthenticated.into());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_picks_largest_units() {
        assert_eq!(humanize(42), "42s");
        assert_eq!(humanize(125), "2m 5s");
        assert_eq!(humanize(7260), "2h 1m");
    }
}
