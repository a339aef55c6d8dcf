use crate::config::Config;
use crate::credentials::AccessCredentials;
use crate::error::{Error, Result, StepFailedDetails};
use crate::kube;
use crate::redact;
use crate::runner::{CommandOutput, Runner, StepRecord};
use crate::shell;

/// Everything a workflow step needs to run a command: the runner, the cluster
/// target, and the secrets that must be masked in logs and output.
pub struct Session<'a> {
    runner: &'a dyn Runner,
    namespace: String,
    access: Option<AccessCredentials>,
    pod: Option<String>,
    secrets: Vec<String>,
}

impl<'a> Session<'a> {
    pub fn new(runner: &'a dyn Runner, config: &Config) -> Self {
        Self {
            runner,
            namespace: config.namespace.clone(),
            access: None,
            pod: None,
            secrets: with_quoted_variants(config.secrets()),
        }
    }

    pub fn set_access(&mut self, access: Option<AccessCredentials>) {
        if let Some(access) = &access {
            self.secrets.extend(with_quoted_variants(access.secrets()));
        }
        self.access = access;
    }

    pub fn set_pod(&mut self, pod: impl Into<String>) {
        self.pod = Some(pod.into());
    }

    pub fn pod(&self) -> Option<&str> {
        self.pod.as_deref()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn redact(&self, text: &str) -> String {
        redact::redact(text, &self.secrets)
    }

    /// Run a script, logging it with secrets masked.
    pub fn exec(&self, script: &str) -> CommandOutput {
        if self.runner.executes() {
            log_status!("run", "{}", self.redact(script));
        } else {
            log_status!("plan", "{}", self.redact(script));
        }
        self.runner.run(script)
    }

    pub fn record(&self, name: &str, script: &str, output: &CommandOutput) -> StepRecord {
        StepRecord {
            name: name.to_string(),
            command: self.redact(script),
            success: output.success,
            exit_code: output.exit_code,
            stdout: self.redact(output.stdout.trim()),
            stderr: self.redact(output.stderr.trim()),
        }
    }

    /// Run a step that must succeed.
    pub fn must_run(&self, name: &str, script: &str) -> Result<StepRecord> {
        self.must_capture(name, script).map(|(record, _)| record)
    }

    /// Like `must_run`, also handing back the raw output for parsing.
    pub fn must_capture(&self, name: &str, script: &str) -> Result<(StepRecord, CommandOutput)> {
        let output = self.exec(script);
        let record = self.record(name, script, &output);
        if !record.success {
            return Err(Error::step_failed(StepFailedDetails {
                step: record.name,
                command: record.command,
                exit_code: record.exit_code,
                stdout: record.stdout,
                stderr: record.stderr,
            }));
        }
        if !record.stdout.is_empty() {
            log_status!("out", "{}", record.stdout);
        }
        Ok((record, output))
    }

    pub fn kubectl(&self, args: &str) -> String {
        kube::kubectl_command(self.access.as_ref(), &self.namespace, args)
    }

    /// Script that runs `command` inside the resolved pod.
    pub fn in_pod(&self, command: &str) -> Result<String> {
        let pod = self.pod.as_deref().ok_or_else(|| {
            Error::internal_unexpected("Pod command requested before the pod was resolved")
        })?;
        Ok(kube::pod_exec_command(
            self.access.as_ref(),
            &self.namespace,
            pod,
            command,
        ))
    }
}

/// Secrets as they appear after one and two rounds of single-quote escaping
/// (plain command, then wrapped for `kubectl exec ... bash -c`).
fn with_quoted_variants(secrets: Vec<String>) -> Vec<String> {
    let mut all = Vec::with_capacity(secrets.len() * 3);
    for secret in secrets.into_iter().filter(|s| !s.is_empty()) {
        let once = shell::escape_single_quote_content(&secret);
        let changed = once != secret;
        all.push(secret);
        if changed {
            let twice = shell::escape_single_quote_content(&once);
            all.push(once);
            all.push(twice);
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use std::cell::RefCell;

    struct Scripted {
        seen: RefCell<Vec<String>>,
        output: CommandOutput,
    }

    impl Runner for Scripted {
        fn run(&self, script: &str) -> CommandOutput {
            self.seen.borrow_mut().push(script.to_string());
            self.output.clone()
        }
    }

    fn config() -> Config {
        let db = DbConfig {
            host: "localhost".to_string(),
            port: "5432".to_string(),
            database: "app".to_string(),
            username: "postgres".to_string(),
            password: "pw-local".to_string(),
        };
        Config {
            namespace: "prod".to_string(),
            pod_prefix: "api-".to_string(),
            credential_cmd: None,
            identity_check_cmd: "true".to_string(),
            pod_workdir: "/tmp".to_string(),
            local_dump_dir: "/tmp".to_string(),
            pg_client_version: "12".to_string(),
            local_db: db.clone(),
            remote_db: db,
        }
    }

    #[test]
    fn must_run_redacts_failure_details() {
        let runner = Scripted {
            seen: RefCell::new(Vec::new()),
            output: CommandOutput::failed(2, "auth failed for pw-local"),
        };
        let session = Session::new(&runner, &config());

        let err = session
            .must_run("create", "PGPASSWORD=pw-local psql")
            .unwrap_err();

        assert_eq!(err.details["command"], "PGPASSWORD=**** psql");
        assert_eq!(err.details["stderr"], "auth failed for ****");
        assert_eq!(runner.seen.borrow().len(), 1);
    }

    #[test]
    fn quoted_passwords_are_redacted_inside_pod_commands() {
        let runner = Scripted {
            seen: RefCell::new(Vec::new()),
            output: CommandOutput::ok(""),
        };
        let mut config = config();
        config.remote_db.password = "it's".to_string();
        let mut session = Session::new(&runner, &config);
        session.set_pod("api-1");

        let script = session
            .in_pod(&format!("PGPASSWORD={} pg_dump", shell::quote_arg("it's")))
            .unwrap();
        let shown = session.redact(&script);
        assert!(
            shown.contains("PGPASSWORD='\\''****'\\'' pg_dump"),
            "{}",
            shown
        );
    }

    #[test]
    fn in_pod_requires_resolved_pod() {
        let runner = Scripted {
            seen: RefCell::new(Vec::new()),
            output: CommandOutput::ok(""),
        };
        let mut session = Session::new(&runner, &config());
        assert!(session.in_pod("ls").is_err());

        session.set_pod("api-7f9c");
        let script = session.in_pod("ls").unwrap();
        assert_eq!(script, "kubectl exec -it api-7f9c -n prod -- bash -c 'ls'");
    }

    #[test]
    fn access_secrets_are_redacted() {
        let runner = Scripted {
            seen: RefCell::new(Vec::new()),
            output: CommandOutput::ok(""),
        };
        let mut session = Session::new(&runner, &config());
        session.set_access(Some(AccessCredentials {
            access_key_id: "AKIA".to_string(),
            secret_access_key: "topsecret".to_string(),
            session_token: "tokentoken".to_string(),
            expiration: None,
        }));

        let script = session.kubectl("get pods");
        assert_eq!(
            session.redact(&script),
            "AWS_ACCESS_KEY_ID=AKIA AWS_SECRET_ACCESS_KEY=**** AWS_SESSION_TOKEN=**** kubectl -n prod get pods"
        );
    }

    #[test]
    fn quoted_variants_only_for_secrets_with_quotes() {
        let variants = with_quoted_variants(vec![
            "plain".to_string(),
            String::new(),
            "it's".to_string(),
        ]);
        assert_eq!(
            variants,
            vec![
                "plain".to_string(),
                "it's".to_string(),
                r"it'\''s".to_string(),
                r"it'\''\'\'''\''s".to_string(),
            ]
        );
    }
}
