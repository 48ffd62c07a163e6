//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netwatch_config::ConfigError;
use netwatch_core::{ConnectionError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach router at {address}: {reason}")]
    #[diagnostic(
        code(netwatch::connection_failed),
        help(
            "Check that the router is reachable, or that an export exists\n\
             in the source directory (see: netwatch config show)."
        )
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Router at {address} sent an unexpected response: {reason}")]
    #[diagnostic(code(netwatch::protocol))]
    Protocol { address: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication rejected by router at {address}")]
    #[diagnostic(
        code(netwatch::auth_failed),
        help("Update the stored secret with: netwatch profiles update <id> --secret <secret>")
    )]
    AuthFailed { address: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netwatch::not_found),
        help("Run: netwatch {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Router profile {profile_id} still owns {device_count} device(s)")]
    #[diagnostic(
        code(netwatch::conflict),
        help(
            "Remove its hosts first: netwatch devices list --profile {profile_id}\n\
             then: netwatch devices forget <id>"
        )
    )]
    Conflict {
        profile_id: String,
        device_count: usize,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration / storage ──────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(netwatch::config),
        help("Inspect the file with: netwatch config show")
    )]
    Config(#[from] ConfigError),

    #[error("State file {path}: {reason}")]
    #[diagnostic(
        code(netwatch::storage),
        help("Point --state (or NETWATCH_STATE) at a writable location.")
    )]
    Storage { path: String, reason: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(netwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Router at {address} did not answer within {seconds}s")]
    #[diagnostic(
        code(netwatch::timeout),
        help("Increase the limit with --timeout or defaults.timeout in the config file.")
    )]
    Timeout { address: String, seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(netwatch::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Protocol { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<ConnectionError> for CliError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Unreachable { address, reason } => {
                Self::ConnectionFailed { address, reason }
            }
            ConnectionError::AuthFailed { address } => Self::AuthFailed { address },
            ConnectionError::Timeout {
                address,
                timeout_secs,
            } => Self::Timeout {
                address,
                seconds: timeout_secs,
            },
            ConnectionError::Protocol { address, reason } => Self::Protocol { address, reason },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, identifier } => Self::NotFound {
                list_command: if entity == "device" {
                    "devices list --profile <id>".into()
                } else {
                    "profiles list".into()
                },
                resource_type: entity.into(),
                identifier,
            },

            CoreError::Conflict {
                profile_id,
                device_count,
            } => Self::Conflict {
                profile_id: profile_id.to_string(),
                device_count,
            },

            CoreError::Connection(e) => e.into(),

            CoreError::Validation { field, reason } => Self::Validation { field, reason },

            CoreError::Storage { path, reason } => Self::Storage {
                path: path.display().to_string(),
                reason,
            },
        }
    }
}
