use pgpull::config::Config;
use std::path::PathBuf;

pub type CmdResult<T> = pgpull::Result<(T, i32)>;

pub struct GlobalArgs {
    /// Explicit config file; falls back to ./config.yaml then ~/.config/pgpull/config.yaml
    pub config: Option<String>,
}

impl GlobalArgs {
    pub fn load_config(&self) -> pgpull::Result<(PathBuf, Config)> {
        pgpull::config::load_resolved(self.config.as_deref())
    }
}

pub mod config;
pub mod credentials;
pub mod plan;
pub mod pod;
pub mod run;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (pgpull::Result<serde_json::Value>, i32) {
    crate::tty::status("pgpull is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Plan(args) => dispatch!(args, global, plan),
        crate::Commands::Pod(args) => dispatch!(args, global, pod),
        crate::Commands::Credentials(args) => dispatch!(args, global, credentials),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
