//! Harness configuration discovery.

use std::path::{Path, PathBuf};

use miette::{Result, miette};

/// Default harness configuration file name.
const CONFIG_NAME: &str = "drizzle.json";

/// Finds `drizzle.json` by searching from the current directory upwards.
///
/// A missing file is not an error: the harness then runs with defaults.
pub fn find_config() -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().map_err(|e| miette!("Cannot get current directory: {}", e))?;
    Ok(find_config_from(&cwd))
}

/// Finds `drizzle.json` starting from the given directory.
pub fn find_config_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_NAME))
        .find(|candidate| candidate.is_file())
}

/// Returns the directory relative skin paths are resolved against.
pub fn config_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
