use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VoxruleError};

/// Top-level configuration for the Voxrule application.
///
/// Loaded from `~/.voxrule/config.toml` by default. Each section corresponds
/// to one crate or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoxruleConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub terminal: TerminalConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl VoxruleConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VoxruleConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VoxruleError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// The data directory with a leading `~` expanded.
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.general.data_dir)
    }

    /// Absolute path of the rules file.
    pub fn rules_path(&self) -> PathBuf {
        self.data_dir().join(&self.store.rules_file)
    }

    /// Absolute path of the settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir().join(&self.store.settings_file)
    }

    /// Absolute path of the admin API bearer token file.
    pub fn token_path(&self) -> PathBuf {
        self.data_dir().join(&self.api.token_file)
    }
}

/// Expand a leading `~` or `~/` to the user's home directory.
///
/// Paths without a leading tilde, or a missing `HOME`, are returned as-is.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" || path.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            let rest = path.trim_start_matches('~').trim_start_matches('/');
            return if rest.is_empty() {
                PathBuf::from(home)
            } else {
                PathBuf::from(home).join(rest)
            };
        }
    }
    PathBuf::from(path)
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the rules file, settings file and API token.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.voxrule".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Rule store file names, relative to the data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub rules_file: String,
    pub settings_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            rules_file: "custom-rules.json".to_string(),
            settings_file: "custom-settings.json".to_string(),
        }
    }
}

/// Dispatch engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between interrupting the device and issuing new audio.
    pub settle_delay_ms: u64,
    /// Wall-clock budget for a single script evaluation.
    pub script_timeout_secs: u64,
    /// Operation budget for a single script evaluation.
    pub script_max_operations: u64,
    pub http_timeout_secs: u64,
    /// Used when a remote-code rule sets no `remoteTimeout`.
    pub remote_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
            script_timeout_secs: 30,
            script_max_operations: 5_000_000,
            http_timeout_secs: 30,
            remote_timeout_secs: 30,
        }
    }
}

/// Terminal command execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Used when a rule sets no `terminalTimeout`.
    pub default_timeout_secs: u64,
    /// Per-stream cap on captured stdout/stderr.
    pub max_output_bytes: usize,
    pub ssh_connect_timeout_secs: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            max_output_bytes: 1024 * 1024,
            ssh_connect_timeout_secs: 10,
        }
    }
}

/// Admin API server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token file name, relative to the data directory.
    pub token_file: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            token_file: "api-token".to_string(),
        }
    }
}

/// Isolated process execution service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub host: String,
    pub port: u16,
    pub python_bin: String,
    pub node_bin: String,
    /// Used when a request carries no `timeout`.
    pub default_timeout_secs: u64,
    /// Parent directory for per-request scratch dirs; system temp when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_root: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            python_bin: "python3".to_string(),
            node_bin: "node".to_string(),
            default_timeout_secs: 30,
            temp_root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = VoxruleConfig::default();
        assert_eq!(config.general.data_dir, "~/.voxrule");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.store.rules_file, "custom-rules.json");
        assert_eq!(config.engine.settle_delay_ms, 2000);
        assert_eq!(config.terminal.max_output_bytes, 1_048_576);
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.runner.port, 3001);
        assert_eq!(config.runner.python_bin, "python3");
        assert!(config.runner.temp_root.is_none());
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[general]
log_level = "warn"

[engine]
settle_delay_ms = 50
"#;
        let file = create_temp_config(content);
        let config = VoxruleConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.engine.settle_delay_ms, 50);
        // Remaining fields use defaults
        assert_eq!(config.engine.http_timeout_secs, 30);
        assert_eq!(config.terminal.ssh_connect_timeout_secs, 10);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
[general]
data_dir = "/srv/voxrule"
log_level = "debug"

[store]
rules_file = "rules.json"
settings_file = "settings.json"

[terminal]
default_timeout_secs = 5
max_output_bytes = 4096
ssh_connect_timeout_secs = 3

[api]
host = "0.0.0.0"
port = 8080
token_file = "token"

[runner]
port = 4001
node_bin = "/usr/local/bin/node"
temp_root = "/tmp/runner"
"#;
        let file = create_temp_config(content);
        let config = VoxruleConfig::load(file.path()).unwrap();
        assert_eq!(config.rules_path(), PathBuf::from("/srv/voxrule/rules.json"));
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/srv/voxrule/settings.json")
        );
        assert_eq!(config.terminal.max_output_bytes, 4096);
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.runner.port, 4001);
        assert_eq!(config.runner.node_bin, "/usr/local/bin/node");
        assert_eq!(config.runner.temp_root.as_deref(), Some("/tmp/runner"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = VoxruleConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.data_dir, "~/.voxrule");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        assert!(VoxruleConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = VoxruleConfig::default();
        config.engine.script_timeout_secs = 7;
        config.save(&path).unwrap();

        assert!(path.exists());
        let reloaded = VoxruleConfig::load(&path).unwrap();
        assert_eq!(reloaded.engine.script_timeout_secs, 7);
        assert_eq!(reloaded.api.token_file, "api-token");
    }

    #[test]
    fn test_expand_home() {
        let home = std::env::var("HOME").unwrap_or_default();
        if !home.is_empty() {
            assert_eq!(expand_home("~"), PathBuf::from(&home));
            assert_eq!(
                expand_home("~/.ssh/id_rsa"),
                PathBuf::from(&home).join(".ssh/id_rsa")
            );
        }
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("~other/x"), PathBuf::from("~other/x"));
    }

    #[test]
    fn test_data_file_paths() {
        let mut config = VoxruleConfig::default();
        config.general.data_dir = "/var/lib/voxrule".to_string();
        assert_eq!(
            config.rules_path(),
            PathBuf::from("/var/lib/voxrule/custom-rules.json")
        );
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/var/lib/voxrule/custom-settings.json")
        );
        assert_eq!(config.token_path(), PathBuf::from("/var/lib/voxrule/api-token"));
    }
}
