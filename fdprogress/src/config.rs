use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::process::DEFAULT_COMMANDS;
use crate::proc::procfs::DEFAULT_PROC_ROOT;

/// Settings loaded from ~/.config/fdprogress/config.toml.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Executable base names to watch.
    #[serde(default = "default_commands")]
    pub commands: Vec<String>,
    /// Estimate throughput with a second pass.
    #[serde(default)]
    pub wait: bool,
    /// Seconds between the two passes.
    #[serde(default = "default_wait_delay")]
    pub wait_delay_secs: u64,
    #[serde(default)]
    pub debug: bool,
    /// Where the process-information tree is mounted.
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            commands: default_commands(),
            wait: false,
            wait_delay_secs: default_wait_delay(),
            debug: false,
            proc_root: default_proc_root(),
        }
    }
}

fn default_commands() -> Vec<String> {
    DEFAULT_COMMANDS.iter().map(|s| s.to_string()).collect()
}

fn default_wait_delay() -> u64 {
    1
}

fn default_proc_root() -> PathBuf {
    PathBuf::from(DEFAULT_PROC_ROOT)
}

impl Config {
    /// Load config from the default path, or return defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config from {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("fdprogress")
        .join("config.toml")
}
