//! kubectl command strings and pod lookup.

use crate::credentials::AccessCredentials;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::shell;

/// `<access> kubectl -n <namespace> <args>`
pub fn kubectl_command(access: Option<&AccessCredentials>, namespace: &str, args: &str) -> String {
    let kubectl = format!("kubectl -n {} {}", shell::quote_arg(namespace), args);
    with_access(access, kubectl)
}

/// `<access> kubectl exec -it <pod> -n <namespace> -- bash -c '<command>'`
pub fn pod_exec_command(
    access: Option<&AccessCredentials>,
    namespace: &str,
    pod: &str,
    command: &str,
) -> String {
    let exec = format!(
        "kubectl exec -it {} -n {} -- bash -c {}",
        shell::quote_arg(pod),
        shell::quote_arg(namespace),
        shell::escape_command_for_shell(command)
    );
    with_access(access, exec)
}

fn with_access(access: Option<&AccessCredentials>, command: String) -> String {
    match access {
        Some(access) => format!("{} {}", access.env_prefix(), command),
        None => command,
    }
}

/// Arguments listing running pods whose line contains `prefix`.
pub fn running_pods_args(prefix: &str) -> String {
    format!(
        "get pods | grep {} | grep Running | awk '{{ print $1 }}'",
        shell::quote_arg(prefix)
    )
}

/// Arguments for `kubectl cp <pod>:<remote> <local>`.
pub fn copy_from_pod_args(pod: &str, remote_path: &str, local_path: &str) -> String {
    format!(
        "cp {} {}",
        shell::quote_arg(&format!("{}:{}", pod, remote_path)),
        shell::quote_arg(local_path)
    )
}

/// First non-empty line of the pod listing.
pub fn pick_pod(listing: &str) -> Option<(String, usize)> {
    let pods: Vec<&str> = listing
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    pods.first().map(|first| (first.to_string(), pods.len()))
}

/// Find the running pod for `prefix` and pin it on the session.
pub fn resolve_pod(session: &mut Session, prefix: &str) -> Result<String> {
    let script = session.kubectl(&running_pods_args(prefix));
    let (_, output) = session.must_capture("resolve-pod", &script)?;

    let (pod, count) = pick_pod(&output.stdout)
        .ok_or_else(|| Error::pod_not_found(session.namespace(), prefix))?;

    if count > 1 {
        log_status!(
            "kube",
            "{} running pods match '{}', using {}",
            count,
            prefix,
            pod
        );
    }

    session.set_pod(pod.clone());
    Ok(pod)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kubectl_command_without_access() {
        assert_eq!(
            kubectl_command(None, "prod", "get pods"),
            "kubectl -n prod get pods"
        );
    }

    #[test]
    fn pod_exec_escapes_single_quotes() {
        let script = pod_exec_command(None, "prod", "api-1", "echo 'hi'");
        assert_eq!(
            script,
            "kubectl exec -it api-1 -n prod -- bash -c 'echo '\\''hi'\\'''"
        );
    }

    #[test]
    fn running_pods_args_filters_running() {
        assert_eq!(
            running_pods_args("api-"),
            "get pods | grep api- | grep Running | awk '{ print $1 }'"
        );
    }

    #[test]
    fn copy_args_join_pod_and_path() {
        assert_eq!(
            copy_from_pod_args("api-1", "/tmp/dump_1.sql", "/home/me/dump_1.sql"),
            "cp api-1:/tmp/dump_1.sql /home/me/dump_1.sql"
        );
    }

    #[test]
    fn pick_pod_takes_first_line() {
        assert_eq!(
            pick_pod("api-1\napi-2\n"),
            Some(("api-1".to_string(), 2))
        );
        assert_eq!(pick_pod("  \n"), None);
    }
}
