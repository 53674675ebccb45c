use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

/// `$REMISE_HOME`, else `~/.remise`
pub fn remise_home() -> Result<PathBuf> {
    home_from(std::env::var_os("REMISE_HOME"), std::env::var_os("HOME"))
}

fn home_from(remise_home: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    if let Some(dir) = remise_home.filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = home.context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".remise"))
}

pub fn ensure_remise_home() -> Result<PathBuf> {
    let dir = remise_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
