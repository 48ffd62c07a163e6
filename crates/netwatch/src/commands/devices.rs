//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use netwatch_core::{Device, DeviceId, DeviceQuery, ProfileId};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Native")]
    native_id: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Since")]
    since: String,
}

impl DeviceRow {
    pub(crate) fn new(d: &Arc<Device>, color: bool) -> Self {
        Self {
            id: d.id.to_string(),
            native_id: d.native_id.to_string(),
            address: d.address.clone(),
            label: d.label.clone().unwrap_or_default(),
            status: output::status_label(d.status, color),
            since: util::fmt_time(d.since),
        }
    }
}

fn detail(d: &Arc<Device>) -> String {
    [
        format!("ID:        {}", d.id),
        format!("Profile:   {}", d.router_profile_id),
        format!("Native ID: {}", d.native_id),
        format!("Address:   {}", d.address),
        format!("Label:     {}", d.label.as_deref().unwrap_or("-")),
        format!("Status:    {}", d.status),
        format!("Since:     {}", util::fmt_time(d.since)),
        format!("Timeout:   {}", d.timeout.as_deref().unwrap_or("-")),
        format!("Interval:  {}", d.interval.as_deref().unwrap_or("-")),
        format!("First seen: {}", util::fmt_time(d.created_at)),
        format!("Last seen:  {}", util::fmt_time(d.updated_at)),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = session.store();
    let format = global.output();

    match args.command {
        DevicesCommand::List {
            profile,
            search,
            status,
        } => {
            let mut query = DeviceQuery::new().status(util::status_filter(status));
            if let Some(term) = search {
                query = query.search(term);
            }
            let devices = store.list_devices(ProfileId(profile), &query)?;
            let out = output::render_list(
                &format,
                &devices,
                |d| DeviceRow::new(d, session.color),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { id } => {
            let device = store.device(DeviceId(id))?;
            let out = output::render_single(&format, &device, detail, |d| d.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Forget { id } => {
            let id = DeviceId(id);
            let device = store.device(id)?;
            let prompt = format!("Forget host {} ({})?", device.address, device.native_id);
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            store.forget_device(id).await?;
            session.persist().await?;
            if !global.quiet {
                eprintln!("✓ Device {id} forgotten");
            }
            Ok(())
        }
    }
}
