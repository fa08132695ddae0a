use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "cc-usage";
const CONFIG_NAME: &str = "config";

/// Optional user settings read from `<config dir>/cc-usage/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding one subdirectory per project
    pub projects_dir: Option<String>,
    /// Days to include when `--days` is not given
    pub default_days: Option<u32>,
}

impl Config {
    /// Projects directory with `~` expanded, if configured
    pub fn projects_dir(&self) -> Option<PathBuf> {
        self.projects_dir
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }
}

/// Path of the config file, whether or not it exists
pub fn config_path() -> Result<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
        .context("Failed to resolve config file path")
}

/// Load the config file if present.
///
/// A missing file yields the defaults; nothing is written to disk.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(Config::default());
    }
    confy::load_path(&path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Default location of Claude Code session logs: `~/.claude/projects`
pub fn default_projects_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".claude").join("projects"))
}

/// Resolve the projects directory: explicit argument, then config, then default.
pub fn resolve_projects_dir(explicit: Option<&str>, config: &Config) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(PathBuf::from(shellexpand::tilde(dir).into_owned()));
    }
    if let Some(dir) = config.projects_dir() {
        return Ok(dir);
    }
    default_projects_dir()
}
