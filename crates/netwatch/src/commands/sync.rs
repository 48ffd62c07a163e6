//! Sync command handler: one fetch → reconcile → summarize pass.

use tabled::{Table, Tabled, settings::Style};

use netwatch_core::{ProfileId, SyncReport};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::error::CliError;
use crate::output;

use super::devices::DeviceRow;
use super::{Session, summary, util};

#[derive(Tabled)]
struct SyncRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Seen")]
    seen: usize,
    #[tabled(rename = "Total")]
    total: usize,
    #[tabled(rename = "Up")]
    up: usize,
    #[tabled(rename = "Down")]
    down: usize,
}

impl From<&SyncReport> for SyncRow {
    fn from(r: &SyncReport) -> Self {
        Self {
            profile: r.profile_id.to_string(),
            seen: r.devices.len(),
            total: r.summary.total_devices,
            up: r.summary.up_devices,
            down: r.summary.down_devices,
        }
    }
}

fn detail(r: &SyncReport, color: bool) -> String {
    let rows: Vec<_> = r.devices.iter().map(|d| DeviceRow::new(d, color)).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    format!("{table}\n{}", summary::detail(&r.summary))
}

pub async fn handle(session: &Session, args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = &session.monitor;
    let format = global.output();

    let targets: Vec<ProfileId> = match args.profile {
        Some(id) => vec![ProfileId(id)],
        None if args.connection.address.is_some() || args.connection.username.is_some() => {
            let connection = util::connection_from_args(args.connection)?;
            let report = monitor.sync_connection(&connection).await?;
            session.persist().await?;
            let out = output::render_single(
                &format,
                &report,
                |r| detail(r, session.color),
                |r| summary::counts(&r.summary),
            )?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }
        None => session
            .store()
            .profiles()
            .iter()
            .filter(|p| p.is_active)
            .map(|p| p.id)
            .collect(),
    };

    if targets.is_empty() {
        return Err(CliError::Validation {
            field: "profile".into(),
            reason: "no active profiles; pass a profile id or mark one with \
                     `netwatch profiles update <id> --active true`"
                .into(),
        });
    }

    let mut reports = Vec::with_capacity(targets.len());
    let mut first_error = None;
    for id in targets {
        match monitor.sync(id).await {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::warn!(profile_id = %id, error = %e, "sync failed");
                first_error.get_or_insert(e);
            }
        }
    }
    session.persist().await?;

    let out = match reports.as_slice() {
        [] => String::new(),
        [report] => output::render_single(
            &format,
            report,
            |r| detail(r, session.color),
            |r| summary::counts(&r.summary),
        )?,
        _ => output::render_list(
            &format,
            &reports,
            |r| SyncRow::from(r),
            |r| format!("{} {}", r.profile_id, summary::counts(&r.summary)),
        )?,
    };
    output::print_output(&out, global.quiet);

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
