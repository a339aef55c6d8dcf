use clap::Args;
use serde::Serialize;

use pgpull::credentials::{self, CredentialsSummary};
use pgpull::runner::LocalRunner;
use pgpull::session::Session;

use super::CmdResult;

#[derive(Args)]
pub struct CredentialsArgs {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsOutput {
    /// False when no credential_cmd is configured.
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<CredentialsSummary>,
}

pub fn run(
    _args: CredentialsArgs,
    global: &crate::commands::GlobalArgs,
) -> CmdResult<CredentialsOutput> {
    let (_, config) = global.load_config()?;

    let runner = LocalRunner::new();
    let session = Session::new(&runner, &config);
    let access = credentials::acquire(&session, &config)?;

    Ok((
        CredentialsOutput {
            configured: config.credential_cmd().is_some(),
            credentials: access.map(|a| a.summary()),
        },
        0,
    ))
}
