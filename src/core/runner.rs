use serde::Serialize;
use std::process::Command;

/// Captured result of one shell invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
            exit_code: 0,
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
            exit_code,
        }
    }

    /// Prefers stderr, falls back to stdout if stderr is empty.
    pub fn error_text(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Executes shell scripts. Every external call in the workflow goes through this.
pub trait Runner {
    fn run(&self, script: &str) -> CommandOutput;

    /// False for runners that only record what would run.
    fn executes(&self) -> bool {
        true
    }
}

/// Runs scripts on this machine with `bash -c`.
#[derive(Debug, Default)]
pub struct LocalRunner;

impl LocalRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Runner for LocalRunner {
    fn run(&self, script: &str) -> CommandOutput {
        match Command::new("bash").args(["-c", script]).output() {
            Ok(out) => CommandOutput {
                stdout: String::from_utf8_lossy(&out.stdout).to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
                success: out.status.success(),
                exit_code: out.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput::failed(-1, format!("Command error: {}", e)),
        }
    }
}

/// Reports success for every script without running anything.
#[derive(Debug, Default)]
pub struct DryRunner;

impl Runner for DryRunner {
    fn run(&self, _script: &str) -> CommandOutput {
        CommandOutput::ok("")
    }

    fn executes(&self) -> bool {
        false
    }
}

/// Serializable record of one executed step (command already redacted).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub name: String,
    pub command: String,
    pub success: bool,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_runner_captures_stdout() {
        let output = LocalRunner::new().run("echo hello");
        assert!(output.success);
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn local_runner_reports_failure_with_stderr() {
        let output = LocalRunner::new().run("echo nope >&2; exit 3");
        assert!(!output.success);
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.error_text(), "nope");
    }

    #[test]
    fn local_runner_supports_pipelines() {
        let output = LocalRunner::new().run("printf 'a b\\nc d\\n' | awk '{ print $1 }'");
        assert_eq!(output.stdout, "a\nc\n");
    }

    #[test]
    fn dry_runner_never_executes() {
        let runner = DryRunner;
        let output = runner.run("exit 1");
        assert!(output.success);
        assert!(!runner.executes());
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let output = CommandOutput {
            stdout: "stdout content".to_string(),
            stderr: "  ".to_string(),
            success: false,
            exit_code: 1,
        };
        assert_eq!(output.error_text(), "stdout content");
    }
}
