//! CLI argument definitions.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use voxrule_core::VoxruleConfig;

/// Voxrule: keyword rules that turn voice transcripts into actions.
#[derive(Parser, Debug)]
#[command(name = "voxrule", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding rules, settings and the API token.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` still wins.
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Admin API plus the dispatch loop over console input (default).
    Serve {
        /// Admin API port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,

        /// Also run the execution service in this process.
        #[arg(long = "with-runner")]
        with_runner: bool,
    },
    /// The isolated process execution service only.
    Runner {
        /// Runner port. `REMOTE_EXECUTOR_PORT` still wins.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
    },
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            port: None,
            with_runner: false,
        })
    }

    /// Priority: --config flag > VOXRULE_CONFIG env var > ~/.voxrule/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        let from_env = std::env::var("VOXRULE_CONFIG").ok();
        config_path_from(self.config.as_ref(), from_env.as_deref())
    }

    /// Write flag overrides into a loaded config.
    pub fn apply_overrides(&self, config: &mut VoxruleConfig) {
        if let Some(dir) = &self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(Command::Runner { port: Some(port) }) = &self.command {
            config.runner.port = *port;
        }
    }
}

fn config_path_from(flag: Option<&PathBuf>, env: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        return path.clone();
    }
    if let Some(path) = env.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    default_config_path()
}

fn default_config_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".voxrule").join("config.toml"),
        Err(_) => PathBuf::from("config.toml"),
    }
}
