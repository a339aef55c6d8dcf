//! Deferred cleanup, run last-registered-first.
//!
//! Tasks are registered as the workflow creates things (dump files, the
//! restore database, the renamed backup). They run once, whether the
//! workflow succeeded or not. A failing task never stops the ones after it.

use crate::runner::StepRecord;
use crate::session::Session;

/// Handle returned by [`CleanupStack::push`], used to disarm a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupHandle(usize);

#[derive(Debug, Clone)]
struct CleanupTask {
    name: String,
    script: String,
    armed: bool,
}

#[derive(Debug, Default)]
pub struct CleanupStack {
    tasks: Vec<CleanupTask>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, script: impl Into<String>) -> CleanupHandle {
        self.tasks.push(CleanupTask {
            name: name.into(),
            script: script.into(),
            armed: true,
        });
        CleanupHandle(self.tasks.len() - 1)
    }

    /// Drop a task that is no longer needed (e.g. a rollback after the swap completed).
    pub fn disarm(&mut self, handle: CleanupHandle) {
        if let Some(task) = self.tasks.get_mut(handle.0) {
            task.armed = false;
        }
    }

    /// Names of armed tasks in execution order.
    pub fn pending(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .rev()
            .filter(|t| t.armed)
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn run(self, session: &Session) -> Vec<StepRecord> {
        let mut records = Vec::new();

        for task in self.tasks.into_iter().rev().filter(|t| t.armed) {
            let output = session.exec(&task.script);
            let record = session.record(&task.name, &task.script, &output);
            if !record.success {
                log_status!(
                    "cleanup",
                    "'{}' failed (exit {}): {}",
                    record.name,
                    record.exit_code,
                    record.stderr
                );
            }
            records.push(record);
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DbConfig};
    use crate::runner::{CommandOutput, Runner};
    use std::cell::RefCell;

    struct FailOn {
        needle: &'static str,
        seen: RefCell<Vec<String>>,
    }

    impl Runner for FailOn {
        fn run(&self, script: &str) -> CommandOutput {
            self.seen.borrow_mut().push(script.to_string());
            if script.contains(self.needle) {
                CommandOutput::failed(1, "nope")
            } else {
                CommandOutput::ok("")
            }
        }
    }

    fn config() -> Config {
        Config {
            namespace: "prod".to_string(),
            pod_prefix: "api-".to_string(),
            credential_cmd: None,
            identity_check_cmd: "true".to_string(),
            pod_workdir: "/tmp".to_string(),
            local_dump_dir: "/tmp".to_string(),
            pg_client_version: "12".to_string(),
            local_db: DbConfig::default(),
            remote_db: DbConfig::default(),
        }
    }

    #[test]
    fn runs_in_reverse_and_continues_after_failure() {
        let runner = FailOn {
            needle: "second",
            seen: RefCell::new(Vec::new()),
        };
        let config = config();
        let session = Session::new(&runner, &config);

        let mut stack = CleanupStack::new();
        stack.push("first", "echo first");
        stack.push("second", "echo second");
        stack.push("third", "echo third");

        let records = stack.run(&session);

        assert_eq!(
            *runner.seen.borrow(),
            vec!["echo third", "echo second", "echo first"]
        );
        assert_eq!(records.len(), 3);
        assert!(!records[1].success);
        assert!(records[2].success);
    }

    #[test]
    fn disarmed_tasks_are_skipped() {
        let runner = FailOn {
            needle: "never",
            seen: RefCell::new(Vec::new()),
        };
        let config = config();
        let session = Session::new(&runner, &config);

        let mut stack = CleanupStack::new();
        stack.push("keep", "echo keep");
        let rollback = stack.push("rollback", "echo rollback");
        stack.disarm(rollback);

        assert_eq!(stack.pending(), vec!["keep"]);
        let records = stack.run(&session);
        assert_eq!(records.len(), 1);
        assert_eq!(*runner.seen.borrow(), vec!["echo keep"]);
    }
}
