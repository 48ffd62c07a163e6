//! Watch command handler: periodic polling until Ctrl-C or `--count`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use netwatch_core::{PollOutcome, ProfileId, Summary};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::{Session, summary, util};

/// One line of watch output.
#[derive(Debug, Serialize)]
struct WatchEvent {
    at: DateTime<Utc>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl WatchEvent {
    fn from_outcome(outcome: PollOutcome) -> Option<Self> {
        match outcome {
            PollOutcome::Pending => None,
            PollOutcome::Synced { report, at } => Some(Self {
                at,
                ok: true,
                summary: Some(report.summary.clone()),
                error: None,
                retryable: false,
            }),
            PollOutcome::Failed {
                message,
                retryable,
                last_known,
                at,
            } => Some(Self {
                at,
                ok: false,
                summary: last_known,
                error: Some(message),
                retryable,
            }),
        }
    }
}

fn line(e: &WatchEvent) -> String {
    let counts = e.summary.as_ref().map_or_else(
        || "no data".to_owned(),
        |s| {
            format!(
                "{} up / {} down / {} total",
                s.up_devices, s.down_devices, s.total_devices
            )
        },
    );
    match e.error {
        None => format!("[{}] {counts}", util::fmt_time(e.at)),
        Some(ref err) => format!("[{}] poll failed: {err} (last known: {counts})", util::fmt_time(e.at)),
    }
}

fn plain(e: &WatchEvent) -> String {
    e.summary
        .as_ref()
        .map_or_else(|| "-".to_owned(), summary::counts)
}

pub async fn handle(session: &Session, args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let interval = match args.interval {
        Some(0) => {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    };

    let handle = session
        .monitor
        .spawn_poller(ProfileId(args.profile), interval)?;
    let mut outcomes = handle.outcomes();
    let format = global.output();
    let mut polls = 0u64;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            changed = outcomes.changed() => {
                if changed.is_err() {
                    break;
                }
                let outcome = outcomes.borrow_and_update().clone();
                if let PollOutcome::Synced { ref report, .. } = outcome {
                    if let Err(e) = session.merge_report(report).await {
                        tracing::warn!(error = %e, "could not save state");
                    }
                }
                let Some(event) = WatchEvent::from_outcome(outcome) else {
                    continue;
                };
                let out = output::render_single(&format, &event, line, plain)?;
                output::print_output(&out, global.quiet);

                polls += 1;
                if args.count.is_some_and(|n| polls >= n) {
                    break;
                }
            }
        }
    }

    handle.stop().await;
    Ok(())
}
