use clap::Args;
use serde::Serialize;

use pgpull::credentials;
use pgpull::kube;
use pgpull::runner::LocalRunner;
use pgpull::session::Session;

use super::CmdResult;

#[derive(Args)]
pub struct PodArgs {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodOutput {
    pub namespace: String,
    pub pod_prefix: String,
    pub pod: String,
}

pub fn run(_args: PodArgs, global: &crate::commands::GlobalArgs) -> CmdResult<PodOutput> {
    let (_, config) = global.load_config()?;

    let runner = LocalRunner::new();
    let mut session = Session::new(&runner, &config);
    let access = credentials::acquire(&session, &config)?;
    session.set_access(access);
    let pod = kube::resolve_pod(&mut session, &config.pod_prefix)?;

    Ok((
        PodOutput {
            namespace: config.namespace.clone(),
            pod_prefix: config.pod_prefix.clone(),
            pod,
        },
        0,
    ))
}
