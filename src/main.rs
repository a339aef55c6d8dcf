use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{config, credentials, plan, pod, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pgpull")]
#[command(version = VERSION)]
#[command(about = "Refresh a local Postgres database from a database reachable only inside a Kubernetes pod")]
struct Cli {
    /// Path to config.yaml (defaults to ./config.yaml, then ~/.config/pgpull/config.yaml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the remote database through a pod and swap it in locally
    Run(run::RunArgs),
    /// Print every command a run would execute, without executing anything
    Plan(plan::PlanArgs),
    /// Resolve the running pod used for the dump
    Pod(pod::PodArgs),
    /// Verify the identity check and credential command
    Credentials(credentials::CredentialsArgs),
    /// Inspect the loaded configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs { config: cli.config };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let _ = output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
