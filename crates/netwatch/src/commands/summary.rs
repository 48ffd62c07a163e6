//! Summary command handler.

use netwatch_core::{ProfileId, Summary};

use crate::cli::{GlobalOpts, SummaryArgs};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

pub(crate) fn detail(s: &Summary) -> String {
    [
        format!("Total:        {}", s.total_devices),
        format!("Up:           {}", s.up_devices),
        format!("Down:         {}", s.down_devices),
        format!("Last updated: {}", util::fmt_time(s.last_updated)),
    ]
    .join("\n")
}

/// `up/down/total`, for plain output.
pub(crate) fn counts(s: &Summary) -> String {
    format!("{}/{}/{}", s.up_devices, s.down_devices, s.total_devices)
}

pub fn handle(session: &Session, args: &SummaryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let summary = session.store().summarize(ProfileId(args.profile))?;
    let out = output::render_single(&global.output(), &summary, detail, counts)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
