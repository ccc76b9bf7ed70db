//! Common paths for roost data storage
//!
//! All roost data is stored under ~/.config/roost/ on all platforms:
//! - config.toml - User configuration
//! - credentials.enc - Encrypted registration and token data

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Get the roost data directory (~/.config/roost/)
///
/// This is consistent across all platforms for simplicity.
pub fn roost_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Storage("could not determine home directory".into()))?;
    let dir = home.join(".config").join("roost");
    fs::create_dir_all(&dir)
        .map_err(|e| Error::Storage(format!("failed to create roost directory: {e}")))?;
    Ok(dir)
}

/// Get the config file path (~/.config/roost/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(roost_dir()?.join("config.toml"))
}

/// Get the credentials file path (~/.config/roost/credentials.enc)
pub fn credentials_path() -> Result<PathBuf> {
    Ok(roost_dir()?.join("credentials.enc"))
}
