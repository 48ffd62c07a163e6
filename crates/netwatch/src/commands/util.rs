//! Shared helpers for command handlers.

use std::io::IsTerminal;

use chrono::{DateTime, Local, Utc};

use netwatch_core::{RouterConnection, StatusFilter};

use crate::cli::{ConnectionArgs, StatusArg};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
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

/// Use `given`, or prompt for the secret without echo.
pub fn secret_or_prompt(given: Option<String>) -> Result<String, CliError> {
    if let Some(secret) = given {
        return Ok(secret);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "secret".into(),
            reason: "pass --secret or set NETWATCH_SECRET when not on a terminal".into(),
        });
    }
    rpassword::prompt_password("Router secret: ").map_err(CliError::Io)
}

/// Build a connection from `--address/--username/--secret`.
pub fn connection_from_args(args: ConnectionArgs) -> Result<RouterConnection, CliError> {
    let address = args.address.ok_or_else(|| missing("address"))?;
    let username = args.username.ok_or_else(|| missing("username"))?;
    let secret = secret_or_prompt(args.secret)?;
    Ok(RouterConnection::new(address, username, secret))
}

fn missing(flag: &str) -> CliError {
    CliError::Validation {
        field: flag.into(),
        reason: format!("--{flag} is required when no profile id is given"),
    }
}

pub fn status_filter(arg: StatusArg) -> StatusFilter {
    match arg {
        StatusArg::All => StatusFilter::All,
        StatusArg::Up => StatusFilter::Up,
        StatusArg::Down => StatusFilter::Down,
    }
}

/// Local wall-clock rendering for table views.
pub fn fmt_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}
