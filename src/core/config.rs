use crate::error::{Error, Result};
use crate::paths;
use crate::redact::MASK;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Postgres caps identifiers at 63 bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Longest suffix appended to the local database name (`_r_` plus a unix timestamp).
const DERIVED_NAME_SUFFIX_LEN: usize = 13;

/// Connection settings for one Postgres server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Root of config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub pod_prefix: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_cmd: Option<String>,

    #[serde(default = "default_identity_check_cmd")]
    pub identity_check_cmd: String,

    #[serde(default = "default_pod_workdir")]
    pub pod_workdir: String,

    #[serde(default = "default_local_dump_dir")]
    pub local_dump_dir: String,

    #[serde(
        default = "default_pg_client_version",
        deserialize_with = "string_or_number"
    )]
    pub pg_client_version: String,

    #[serde(default)]
    pub local_db: DbConfig,

    #[serde(default)]
    pub remote_db: DbConfig,
}

fn default_identity_check_cmd() -> String {
    "aws sts get-caller-identity".to_string()
}

fn default_pod_workdir() -> String {
    "/tmp".to_string()
}

fn default_local_dump_dir() -> String {
    "~".to_string()
}

fn default_pg_client_version() -> String {
    "12".to_string()
}

/// Accept `5432` and `"5432"` alike.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

impl Config {
    /// Credential command, treating a blank value as absent.
    pub fn credential_cmd(&self) -> Option<&str> {
        self.credential_cmd
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Local dump directory with `~` expanded.
    pub fn local_dump_dir_expanded(&self) -> String {
        let expanded = shellexpand::tilde(&self.local_dump_dir).to_string();
        trim_trailing_slash(&expanded)
    }

    pub fn pod_workdir(&self) -> String {
        trim_trailing_slash(&self.pod_workdir)
    }

    /// Copy with every password masked, for display.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        for db in [&mut copy.local_db, &mut copy.remote_db] {
            if !db.password.is_empty() {
                db.password = MASK.to_string();
            }
        }
        copy
    }

    /// Passwords that must never reach logs or output.
    pub fn secrets(&self) -> Vec<String> {
        vec![self.local_db.password.clone(), self.remote_db.password.clone()]
    }

    pub fn validate(&self, path: Option<&Path>) -> Result<()> {
        let path_str = path.map(|p| p.display().to_string());

        require("namespace", &self.namespace, &path_str)?;
        require("pod_prefix", &self.pod_prefix, &path_str)?;
        require("pod_workdir", &self.pod_workdir, &path_str)?;
        require("local_dump_dir", &self.local_dump_dir, &path_str)?;
        require("pg_client_version", &self.pg_client_version, &path_str)?;

        validate_db("local_db", &self.local_db, &path_str)?;
        validate_db("remote_db", &self.remote_db, &path_str)?;

        let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .map_err(|e| Error::internal_unexpected(e.to_string()))?;
        let database = &self.local_db.database;
        if !identifier.is_match(database) {
            return Err(Error::config_invalid_value(
                "local_db.database",
                Some(database.clone()),
                "Must be a plain identifier (letters, digits, underscore)",
            ));
        }
        if database.len() + DERIVED_NAME_SUFFIX_LEN > MAX_IDENTIFIER_LEN {
            return Err(Error::config_invalid_value(
                "local_db.database",
                Some(database.clone()),
                format!(
                    "Must be at most {} characters so derived names fit Postgres limits",
                    MAX_IDENTIFIER_LEN - DERIVED_NAME_SUFFIX_LEN
                ),
            ));
        }

        let version = Regex::new(r"^[0-9]+(\.[0-9]+)*$")
            .map_err(|e| Error::internal_unexpected(e.to_string()))?;
        if !version.is_match(self.pg_client_version.trim()) {
            return Err(Error::config_invalid_value(
                "pg_client_version",
                Some(self.pg_client_version.clone()),
                "Must be a version number such as 12 or 15.4",
            ));
        }

        Ok(())
    }
}

fn trim_trailing_slash(value: &str) -> String {
    let trimmed = value.trim_end_matches('/');
    if trimmed.is_empty() && value.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn require(key: &str, value: &str, path: &Option<String>) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::config_missing_key(key, path.clone()));
    }
    Ok(())
}

fn validate_db(prefix: &str, db: &DbConfig, path: &Option<String>) -> Result<()> {
    require(&format!("{}.host", prefix), &db.host, path)?;
    require(&format!("{}.port", prefix), &db.port, path)?;
    require(&format!("{}.database", prefix), &db.database, path)?;
    require(&format!("{}.username", prefix), &db.username, path)?;

    if db.port.trim().parse::<u16>().is_err() {
        return Err(Error::config_invalid_value(
            format!("{}.port", prefix),
            Some(db.port.clone()),
            "Must be a TCP port number",
        ));
    }

    Ok(())
}

/// Pick the config file: explicit path, then ./config.yaml, then ~/.config/pgpull/config.yaml.
pub fn resolve_config_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(explicit) = explicit {
        let path = PathBuf::from(shellexpand::tilde(explicit).to_string());
        if path.is_file() {
            return Ok(path);
        }
        return Err(Error::config_not_found(vec![path.display().to_string()]));
    }

    first_existing(default_candidates())
}

/// `./config.yaml`, then the per-user file when `HOME` is set.
fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![paths::working_dir_config()];
    if let Ok(user) = paths::user_config() {
        candidates.push(user);
    }
    candidates
}

fn first_existing(candidates: Vec<PathBuf>) -> Result<PathBuf> {
    let mut tried = Vec::new();
    for candidate in candidates {
        if candidate.is_file() {
            return Ok(candidate);
        }
        tried.push(candidate.display().to_string());
    }

    Err(Error::config_not_found(tried))
}

pub fn from_yaml_str(raw: &str, path: &Path) -> Result<Config> {
    let config: Config = serde_yml::from_str(raw)
        .map_err(|e| Error::config_invalid_yaml(path.display().to_string(), e))?;
    config.validate(Some(path))?;
    Ok(config)
}

pub fn load(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;
    from_yaml_str(&raw, path)
}

/// Resolve and load in one call; returns the path that was used.
pub fn load_resolved(explicit: Option<&str>) -> Result<(PathBuf, Config)> {
    let path = resolve_config_path(explicit)?;
    let config = load(&path)?;
    log_status!("config", "Loaded {}", path.display());
    Ok((path, config))
}
