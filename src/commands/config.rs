use clap::{Args, Subcommand};
use serde::Serialize;

use pgpull::config::{self, Config};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display the loaded configuration with passwords masked
    Show,
    /// Show which config file would be used
    Path,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<Config>,
}

pub fn run(args: ConfigArgs, global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show => {
            let (path, config) = global.load_config()?;
            Ok((
                ConfigOutput {
                    command: "config.show".to_string(),
                    path: path.display().to_string(),
                    config: Some(config.redacted()),
                },
                0,
            ))
        }
        ConfigCommand::Path => {
            let path = config::resolve_config_path(global.config.as_deref())?;
            Ok((
                ConfigOutput {
                    command: "config.path".to_string(),
                    path: path.display().to_string(),
                    config: None,
                },
                0,
            ))
        }
    }
}
