//! The refresh workflow: install client, dump in the pod, copy, restore, swap.
//!
//! The local database is never overwritten in place. The dump is restored into
//! a fresh `<db>_r_<ts>` database, then two renames swap it in:
//!
//! ```text
//! <db>       -> <db>_<ts>   (backup)
//! <db>_r_<ts> -> <db>
//! ```
//!
//! The backup is dropped by the final cleanup unless `keep_backup` is set.
//! If the second rename fails, a rollback cleanup moves the backup back to
//! `<db>` before the restore database is dropped.

use serde::Serialize;

use crate::cleanup::CleanupStack;
use crate::config::Config;
use crate::credentials::{self, AccessCredentials};
use crate::error::Result;
use crate::install;
use crate::kube;
use crate::postgres::{self, RefreshNames};
use crate::redact::MASK;
use crate::runner::{DryRunner, Runner, StepRecord};
use crate::session::Session;
use crate::shell;

/// Pod name shown by `plan`, where no pod is looked up.
pub const POD_PLACEHOLDER: &str = "<pod>";

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub skip_install: bool,
    pub keep_backup: bool,
    /// Unix seconds; names the dump file and the derived databases.
    pub timestamp: i64,
}

impl RefreshOptions {
    pub fn now(skip_install: bool, keep_backup: bool) -> Self {
        Self {
            skip_install,
            keep_backup,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub pod: String,
    pub dump_file: String,
    pub remote_dump_path: String,
    pub local_dump_path: String,
    pub restore_database: String,
    pub backup_database: String,
    pub backup_kept: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_warning: Option<String>,
    pub steps: Vec<StepRecord>,
    pub cleanup: Vec<StepRecord>,
    pub cleanup_failures: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedCommand {
    pub name: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshPlan {
    pub namespace: String,
    pub pod_prefix: String,
    pub dump_file: String,
    pub restore_database: String,
    pub backup_database: String,
    pub steps: Vec<PlannedCommand>,
    pub cleanup: Vec<PlannedCommand>,
}

/// Acquire credentials, find the pod, then run every step against it.
pub fn run(runner: &dyn Runner, config: &Config, options: &RefreshOptions) -> Result<RefreshReport> {
    let mut session = Session::new(runner, config);
    let access = credentials::acquire(&session, config)?;
    session.set_access(access);
    kube::resolve_pod(&mut session, &config.pod_prefix)?;
    execute(&session, config, options)
}

/// The commands `run` would issue on the success path, with secrets masked.
pub fn plan(config: &Config, options: &RefreshOptions) -> Result<RefreshPlan> {
    let runner = DryRunner;
    let mut session = Session::new(&runner, config);
    if config.credential_cmd().is_some() {
        session.set_access(Some(AccessCredentials {
            access_key_id: MASK.to_string(),
            secret_access_key: MASK.to_string(),
            session_token: MASK.to_string(),
            expiration: None,
        }));
    }
    session.set_pod(POD_PLACEHOLDER);

    let report = execute(&session, config, options)?;
    let planned = |records: Vec<StepRecord>| {
        records
            .into_iter()
            .map(|r| PlannedCommand {
                name: r.name,
                command: r.command,
            })
            .collect::<Vec<_>>()
    };

    Ok(RefreshPlan {
        namespace: config.namespace.clone(),
        pod_prefix: config.pod_prefix.clone(),
        dump_file: report.dump_file,
        restore_database: report.restore_database,
        backup_database: report.backup_database,
        steps: planned(report.steps),
        cleanup: planned(report.cleanup),
    })
}

#[derive(Default)]
struct Progress {
    steps: Vec<StepRecord>,
    restore_warning: Option<String>,
}

/// Run the steps on a session whose pod is already set, then the cleanup stack.
pub fn execute(session: &Session, config: &Config, options: &RefreshOptions) -> Result<RefreshReport> {
    let pod = session.pod().unwrap_or_default().to_string();
    let names = RefreshNames::new(
        &config.local_db.database,
        options.timestamp,
        &config.pod_workdir(),
        &config.local_dump_dir_expanded(),
    );

    let mut cleanup = CleanupStack::new();
    let mut progress = Progress::default();

    let outcome = run_steps(session, config, options, &names, &mut cleanup, &mut progress);

    log_status!("cleanup", "Running {} cleanup task(s)", cleanup.pending().len());
    let cleanup_records = cleanup.run(session);
    let cleanup_failures = cleanup_records.iter().filter(|r| !r.success).count();

    match outcome {
        Ok(()) => Ok(RefreshReport {
            pod,
            dump_file: names.dump_file,
            remote_dump_path: names.remote_dump_path,
            local_dump_path: names.local_dump_path,
            restore_database: names.restore_db,
            backup_database: names.backup_db,
            backup_kept: options.keep_backup,
            restore_warning: progress.restore_warning,
            steps: progress.steps,
            cleanup: cleanup_records,
            cleanup_failures,
        }),
        Err(err) => {
            let completed: Vec<&str> = progress.steps.iter().map(|s| s.name.as_str()).collect();
            Err(err
                .with_detail("completedSteps", serde_json::json!(completed))
                .with_detail(
                    "cleanup",
                    serde_json::to_value(&cleanup_records).unwrap_or_default(),
                ))
        }
    }
}

fn run_steps(
    session: &Session,
    config: &Config,
    options: &RefreshOptions,
    names: &RefreshNames,
    cleanup: &mut CleanupStack,
    progress: &mut Progress,
) -> Result<()> {
    let local = &config.local_db;
    let current_db = local.database.as_str();

    if !options.skip_install {
        for (name, command) in install::client_install_steps(&config.pg_client_version) {
            progress
                .steps
                .push(session.must_run(name, &session.in_pod(&command)?)?);
        }
    }

    let dump = postgres::dump_command(&config.remote_db, &names.remote_dump_path);
    progress
        .steps
        .push(session.must_run("dump", &session.in_pod(&dump)?)?);
    cleanup.push(
        "remove-pod-dump",
        session.in_pod(&format!("rm -f {}", shell::quote_path(&names.remote_dump_path)))?,
    );

    let copy = session.kubectl(&kube::copy_from_pod_args(
        session.pod().unwrap_or(POD_PLACEHOLDER),
        &names.remote_dump_path,
        &names.local_dump_path,
    ));
    progress.steps.push(session.must_run("copy-dump", &copy)?);
    cleanup.push(
        "remove-local-dump",
        format!("rm -f {}", shell::quote_path(&names.local_dump_path)),
    );

    let create = postgres::psql_command(
        local,
        current_db,
        &postgres::create_database(&names.restore_db),
    );
    progress
        .steps
        .push(session.must_run("create-restore-db", &create)?);
    cleanup.push(
        "drop-restore-db",
        postgres::psql_command(
            local,
            current_db,
            &postgres::drop_database_if_exists(&names.restore_db),
        ),
    );

    // pg_restore exits non-zero on harmless errors (missing roles, extensions), so keep going.
    let restore = postgres::restore_command(local, &names.restore_db, &names.local_dump_path);
    let output = session.exec(&restore);
    let record = session.record("restore", &restore, &output);
    if !record.success {
        let warning = if record.stderr.is_empty() {
            record.stdout.clone()
        } else {
            record.stderr.clone()
        };
        log_status!("restore", "WARNING restore error: {}", warning);
        progress.restore_warning = Some(warning);
    }
    progress.steps.push(record);

    // Connected to the restore db: Postgres refuses to rename the database you are connected to.
    let to_backup = postgres::psql_command(
        local,
        &names.restore_db,
        &postgres::rename_database(current_db, &names.backup_db),
    );
    progress
        .steps
        .push(session.must_run("rename-current-to-backup", &to_backup)?);
    let rollback = cleanup.push(
        "rename-backup-to-current",
        postgres::psql_command(
            local,
            &names.restore_db,
            &postgres::rename_database(&names.backup_db, current_db),
        ),
    );

    let to_current = postgres::psql_command(
        local,
        &names.backup_db,
        &postgres::rename_database(&names.restore_db, current_db),
    );
    progress
        .steps
        .push(session.must_run("rename-restore-to-current", &to_current)?);
    cleanup.disarm(rollback);

    if options.keep_backup {
        log_status!("refresh", "Keeping previous database as {}", names.backup_db);
    } else {
        cleanup.push(
            "drop-backup-db",
            postgres::psql_command(local, current_db, &postgres::drop_database(&names.backup_db)),
        );
    }

    Ok(())
}
