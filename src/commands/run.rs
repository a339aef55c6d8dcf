use clap::Args;

use pgpull::refresh::{self, RefreshOptions, RefreshReport};
use pgpull::runner::LocalRunner;

use super::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Skip installing the Postgres client inside the pod
    #[arg(long)]
    pub skip_install: bool,

    /// Keep the previous local database instead of dropping it after the swap
    #[arg(long)]
    pub keep_backup: bool,

    /// Do not ask for confirmation before replacing the local database
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(args: RunArgs, global: &crate::commands::GlobalArgs) -> CmdResult<RefreshReport> {
    let (_, config) = global.load_config()?;

    if !args.yes && crate::tty::can_prompt() {
        let question = format!(
            "Replace local database '{}' on {} with '{}' from namespace '{}'?",
            config.local_db.database, config.local_db.host, config.remote_db.database, config.namespace
        );
        if !crate::tty::confirm(&question)? {
            return Err(pgpull::Error::validation_invalid_argument(
                "confirmation",
                "Refresh aborted by user",
            ));
        }
    }

    let options = RefreshOptions::now(args.skip_install, args.keep_backup);
    let report = refresh::run(&LocalRunner::new(), &config, &options)?;

    let exit_code = exit_code_for(&report);
    Ok((report, exit_code))
}

/// A finished refresh with leftover cleanup still exits non-zero.
fn exit_code_for(report: &RefreshReport) -> i32 {
    if report.cleanup_failures > 0 {
        1
    } else {
        0
    }
}
