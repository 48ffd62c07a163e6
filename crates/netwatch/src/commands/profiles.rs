//! Router profile command handlers.

use std::sync::Arc;

use secrecy::SecretString;
use tabled::Tabled;

use netwatch_core::{
    ConnectionResult, NewProfile, ProfileId, ProfilePatch, RouterConnection, RouterProfile,
};

use crate::cli::{GlobalOpts, ProfilesArgs, ProfilesCommand};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Arc<RouterProfile>> for ProfileRow {
    fn from(p: &Arc<RouterProfile>) -> Self {
        Self {
            id: p.id.to_string(),
            name: p.name.clone(),
            address: p.address.clone(),
            username: p.username.clone(),
            active: if p.is_active { "yes" } else { "no" }.into(),
            updated: util::fmt_time(p.updated_at),
        }
    }
}

fn detail(p: &Arc<RouterProfile>) -> String {
    [
        format!("ID:       {}", p.id),
        format!("Name:     {}", p.name),
        format!("Address:  {}", p.address),
        format!("Username: {}", p.username),
        "Secret:   ****".to_owned(),
        format!("Active:   {}", p.is_active),
        format!("Created:  {}", util::fmt_time(p.created_at)),
        format!("Updated:  {}", util::fmt_time(p.updated_at)),
    ]
    .join("\n")
}

fn test_detail(r: &ConnectionResult) -> String {
    let mark = if r.success { "✓" } else { "✗" };
    match r.router_identity {
        Some(ref identity) => format!("{mark} {}\n  Identity: {identity}", r.message),
        None => format!("{mark} {}", r.message),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    session: &Session,
    args: ProfilesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = session.store();
    let format = global.output();

    match args.command {
        ProfilesCommand::List => {
            let profiles = store.profiles();
            let out = output::render_list(
                &format,
                &profiles,
                |p| ProfileRow::from(p),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::Get { id } => {
            let profile = store.profile(ProfileId(id))?;
            let out = output::render_single(&format, &profile, detail, |p| p.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::Create {
            name,
            address,
            username,
            secret,
            active,
        } => {
            let secret = util::secret_or_prompt(secret)?;
            let profile = store
                .create_profile(NewProfile::new(name, address, username, secret).active(active))?;
            session.persist().await?;

            let out = output::render_single(&format, &profile, detail, |p| p.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::Update {
            id,
            name,
            address,
            username,
            secret,
            active,
        } => {
            let patch = ProfilePatch {
                name,
                address,
                username,
                secret: secret.map(SecretString::from),
                is_active: active,
            };
            let profile = store.update_profile(ProfileId(id), patch)?;
            session.persist().await?;

            let out = output::render_single(&format, &profile, detail, |p| p.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProfilesCommand::Delete { id } => {
            let id = ProfileId(id);
            let profile = store.profile(id)?;
            if !util::confirm(&format!("Delete router profile '{}'?", profile.name), global.yes)? {
                return Ok(());
            }
            store.delete_profile(id).await?;
            session.persist().await?;
            if !global.quiet {
                eprintln!("✓ Router profile {id} deleted");
            }
            Ok(())
        }

        ProfilesCommand::Test { id, connection } => {
            let connection = match id {
                Some(id) => RouterConnection::from(store.profile(ProfileId(id))?.as_ref()),
                None => util::connection_from_args(connection)?,
            };
            let result = session.monitor.test_connection(&connection).await;

            let out = output::render_single(&format, &result, test_detail, |r| {
                r.router_identity.clone().unwrap_or_default()
            })?;
            output::print_output(&out, global.quiet);

            if result.success {
                Ok(())
            } else {
                Err(CliError::ConnectionFailed {
                    address: connection.address,
                    reason: result.message,
                })
            }
        }
    }
}
