use clap::Args;

use pgpull::refresh::{self, RefreshOptions, RefreshPlan};

use super::CmdResult;

#[derive(Args)]
pub struct PlanArgs {
    /// Leave the client installation steps out of the plan
    #[arg(long)]
    pub skip_install: bool,

    /// Plan without dropping the previous local database
    #[arg(long)]
    pub keep_backup: bool,
}

pub fn run(args: PlanArgs, global: &crate::commands::GlobalArgs) -> CmdResult<RefreshPlan> {
    let (_, config) = global.load_config()?;
    let options = RefreshOptions::now(args.skip_install, args.keep_backup);
    Ok((refresh::plan(&config, &options)?, 0))
}
