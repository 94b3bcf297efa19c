//! Filesystem locations for persistent state
//!
//! Configuration and the cache database share one directory,
//! `~/.config/roost/`, holding `config.toml` and `roost.sqlite`.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Directory holding all persistent state, created on first use
pub fn roost_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join("roost");
    fs::create_dir_all(&dir).context("Failed to create roost directory")?;
    Ok(dir)
}

/// Location of the configuration file
pub fn config_path() -> Result<PathBuf> {
    Ok(roost_dir()?.join("config.toml"))
}

/// Location of the cache database
pub fn database_path() -> Result<PathBuf> {
    Ok(roost_dir()?.join("roost.sqlite"))
}
