//! Command-line arguments for the `fg-node` operator daemon.
//!
//! Configuration is layered: a YAML/TOML file under `--home`, overridden by
//! `FG__`-prefixed environment variables (per spec.md §6), overridden last
//! by explicit flags.

use std::path::PathBuf;

use clap::Parser;

use crate::error::CliError;

const HOME_FOLDER: &str = ".finality-gadget";
const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Parser, Clone, Debug)]
#[command(version, about = "Babylon finality-gadget operator", long_about = None)]
pub struct Args {
    /// Home directory holding config, the EOTS keystore, and the KV store
    /// (default: `$HOME/.finality-gadget`).
    #[arg(long, env = "FG_HOME", value_name = "HOME_DIR")]
    pub home: Option<PathBuf>,

    /// Configuration file path (default: `<home>/config.toml`).
    #[arg(long, env = "FG_CONFIG", value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "FG_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "FG_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn home_dir(&self) -> Result<PathBuf, CliError> {
        match &self.home {
            Some(path) => Ok(path.clone()),
            None => default_home_dir(),
        }
    }

    pub fn config_file_path(&self) -> Result<PathBuf, CliError> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(self.home_dir()?.join(CONFIG_FILE)),
        }
    }
}

/// `$HOME/.finality-gadget`, shared by `Args::home_dir` and the short-lived
/// CLI utility binaries (`fg-keys`, `fg-show-pubkey`) that don't carry the
/// full daemon `Args`.
pub fn default_home_dir() -> Result<PathBuf, CliError> {
    Ok(directories::BaseDirs::new()
        .ok_or(CliError::HomeDir)?
        .home_dir()
        .join(HOME_FOLDER))
}
