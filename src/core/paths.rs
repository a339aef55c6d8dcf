use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// File name looked up in the working directory and the user config directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Base pgpull config directory (~/.config/pgpull/)
pub fn pgpull() -> Result<PathBuf> {
    let home = env::var("HOME").map_err(|_| {
        Error::internal_unexpected("HOME environment variable not set".to_string())
    })?;
    Ok(PathBuf::from(home).join(".config").join("pgpull"))
}

/// Per-user fallback config file
pub fn user_config() -> Result<PathBuf> {
    Ok(pgpull()?.join(CONFIG_FILE_NAME))
}

/// Config file in the current working directory
pub fn working_dir_config() -> PathBuf {
    PathBuf::from(".").join(CONFIG_FILE_NAME)
}
