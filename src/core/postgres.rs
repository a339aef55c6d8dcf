//! psql / pg_dump / pg_restore command strings and derived database names.

use crate::config::DbConfig;
use crate::shell;

const DUMP_FLAGS: &str = "-Fc -x";
const RESTORE_FLAGS: &str = "-x -O -c --if-exists";

fn connection_args(db: &DbConfig, database: &str) -> String {
    format!(
        "-h {} -p {} -U {} -d {}",
        shell::quote_arg(&db.host),
        shell::quote_arg(db.port.trim()),
        shell::quote_arg(&db.username),
        shell::quote_arg(database)
    )
}

fn password_env(db: &DbConfig) -> String {
    shell::env_assignment("PGPASSWORD", &db.password)
}

/// `PGPASSWORD=… psql -h … -p … -U … -d <connect_db> -c "<sql>"`
pub fn psql_command(db: &DbConfig, connect_db: &str, sql: &str) -> String {
    format!(
        "{} psql {} -c {}",
        password_env(db),
        connection_args(db, connect_db),
        shell::double_quote(sql)
    )
}

/// Custom-format dump of `db.database` without privileges.
pub fn dump_command(db: &DbConfig, file: &str) -> String {
    format!(
        "{} pg_dump {} {} -f {}",
        password_env(db),
        connection_args(db, &db.database),
        DUMP_FLAGS,
        shell::quote_arg(file)
    )
}

/// Restore into `target_db`, dropping existing objects first, ignoring owners and privileges.
pub fn restore_command(db: &DbConfig, target_db: &str, file: &str) -> String {
    format!(
        "{} pg_restore {} {} {}",
        password_env(db),
        connection_args(db, target_db),
        RESTORE_FLAGS,
        shell::quote_arg(file)
    )
}

pub fn create_database(name: &str) -> String {
    format!("CREATE DATABASE {}", name)
}

pub fn rename_database(from: &str, to: &str) -> String {
    format!("ALTER DATABASE {} RENAME TO {}", from, to)
}

pub fn drop_database(name: &str) -> String {
    format!("DROP DATABASE {}", name)
}

pub fn drop_database_if_exists(name: &str) -> String {
    format!("DROP DATABASE IF EXISTS {}", name)
}

/// Names derived from one run's timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshNames {
    pub dump_file: String,
    pub remote_dump_path: String,
    pub local_dump_path: String,
    /// Fresh database that receives the dump.
    pub restore_db: String,
    /// Name the current local database is moved to during the swap.
    pub backup_db: String,
}

impl RefreshNames {
    pub fn new(database: &str, timestamp: i64, pod_workdir: &str, local_dump_dir: &str) -> Self {
        let dump_file = format!("dump_{}.sql", timestamp);
        Self {
            remote_dump_path: join_path(pod_workdir, &dump_file),
            local_dump_path: join_path(local_dump_dir, &dump_file),
            dump_file,
            restore_db: format!("{}_r_{}", database, timestamp),
            backup_db: format!("{}_{}", database, timestamp),
        }
    }
}

fn join_path(dir: &str, file: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, file)
    } else {
        format!("{}/{}", dir, file)
    }
}
